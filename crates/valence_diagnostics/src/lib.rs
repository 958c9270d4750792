//! Diagnostics reported by the frontend during a compile.
//!
//! The frontend never throws on problems in user code. It emits [`Diagnostic`]s
//! into the unit's [`DiagnosticSink`], which the engine inspects after checking
//! (for example to honor `--fatal-warnings`) and exposes to callers.
//! [`TerminalRenderer`] formats them for logs.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
