//! Plain-text rendering of diagnostics for logs.

use crate::diagnostic::Diagnostic;

/// Formats diagnostics into strings.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic. `source` is the text of the file the
    /// diagnostic points into, when the caller has it.
    fn render(&self, diag: &Diagnostic, source: Option<&str>) -> String;
}

/// Renders diagnostics in a compiler-style terminal format:
///
/// ```text
/// /p/src/main.vala:3:5: error: The name `foo' does not exist
///     3 | foo ();
///       | ^
///   = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to quote the offending source line.
    pub show_source: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(show_source: bool) -> Self {
        Self { show_source }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source: Option<&str>) -> String {
        let mut out = match &diag.location {
            Some(loc) => format!("{loc}: {}: {}\n", diag.severity, diag.message),
            None => format!("{}: {}\n", diag.severity, diag.message),
        };

        let quoted = diag
            .location
            .as_ref()
            .filter(|_| self.show_source)
            .and_then(|loc| {
                let line = source?.lines().nth(loc.line.checked_sub(1)? as usize)?;
                Some((loc, line))
            });
        if let Some((loc, line)) = quoted {
            let number = loc.line.to_string();
            let gutter = " ".repeat(number.len());
            let indent = " ".repeat((loc.column as usize).saturating_sub(1));
            out.push_str(&format!("    {number} | {line}\n"));
            out.push_str(&format!("    {gutter} | {indent}^\n"));
        }

        for note in &diag.notes {
            out.push_str(&format!("  = note: {note}\n"));
        }
        out
    }
}
