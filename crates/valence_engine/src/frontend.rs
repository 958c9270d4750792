//! Interfaces of the external language frontend.
//!
//! The engine never parses or type-checks code itself. It hands documents to
//! a [`Context`] created by a [`Frontend`] and asks it to parse, check and
//! emit outputs. Everything the frontend wants to report goes to the
//! [`DiagnosticSink`] it was given.

use std::io;
use std::path::Path;
use std::sync::Arc;
use valence_config::BuildConfiguration;
use valence_diagnostics::DiagnosticSink;
use valence_source::{FileId, ParsePhase, SourceDocument};

/// Factory for compiler contexts.
pub trait Frontend: Send + Sync {
    /// Creates an empty context for one compile of one unit.
    fn create_context(
        &self,
        config: &BuildConfiguration,
        reporter: Arc<DiagnosticSink>,
    ) -> Box<dyn Context>;
}

/// One frontend compiler context.
///
/// All calls happen while the build context scope is held for this context.
pub trait Context: Send + Sync {
    /// Loads a package. Returns `false` if it cannot be located.
    fn add_package(&mut self, name: &str) -> bool;

    /// Imports `namespace` implicitly into the context root.
    fn add_default_import(&mut self, namespace: &str);

    /// Registers a source document.
    fn add_source(&mut self, source: &SourceDocument);

    /// Parses every registered source belonging to `phase`.
    fn parse(&mut self, phase: ParsePhase);

    /// Runs semantic analysis over everything parsed so far.
    fn check(&mut self);

    /// Every file the context knows about, including package interfaces.
    fn source_files(&self) -> Vec<FileId>;

    /// Symbols declared in `file`.
    fn symbols(&self, file: &FileId) -> Vec<SymbolInfo>;

    /// Writes the public package interface.
    fn write_interface(&self, path: &Path) -> io::Result<()>;

    /// Writes the internal package interface.
    fn write_internal_interface(&self, path: &Path) -> io::Result<()>;

    /// Writes the introspection repository, or returns `None` if the
    /// frontend cannot produce one.
    fn write_introspection(&self, path: &Path) -> Option<io::Result<()>> {
        let _ = path;
        None
    }
}

/// What a symbol is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SymbolKind {
    /// `namespace`
    Namespace,
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `struct`
    Struct,
    /// `enum`
    Enum,
    /// `errordomain`
    ErrorDomain,
    /// `delegate`
    Delegate,
    /// Method or free function.
    Method,
    /// Property.
    Property,
    /// Field.
    Field,
    /// Constant.
    Constant,
    /// Signal.
    Signal,
    /// Local variable, parameter or anything else.
    Other,
}

/// A declared symbol as reported by the frontend.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SymbolInfo {
    /// Simple name.
    pub name: String,
    /// Dotted name from the root namespace, e.g. `Demo.App.run`.
    pub qualified_name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Name in the generated C code, if it has one.
    pub c_name: Option<String>,
    /// 1-based line of the declaration.
    pub line: u32,
    /// 1-based column of the declaration.
    pub column: u32,
}

impl SymbolInfo {
    /// Nesting depth derived from the qualified name. Root symbols are at 0.
    pub fn depth(&self) -> usize {
        self.qualified_name.matches('.').count()
    }
}
