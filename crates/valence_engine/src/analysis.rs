//! Per-file analyses computed from a compiled artifact.
//!
//! The set of analyses is closed. [`AnalysisKind`] names one, and
//! [`compute`] matches on it to pick the constructor, so adding a kind means
//! adding a variant and an arm here.

use crate::error::BuildError;
use crate::frontend::SymbolKind;
use crate::unit::Artifact;
use std::collections::BTreeMap;
use std::sync::Arc;
use valence_source::FileId;

/// Which analysis to compute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AnalysisKind {
    /// Declared symbols in position order.
    Outline,
    /// Indentation and parenthesis spacing conventions.
    CodeStyle,
}

/// A computed analysis. Cheap to clone; the payload is shared and never
/// changes after construction.
#[derive(Clone, Debug)]
pub enum Analysis {
    /// See [`AnalysisKind::Outline`].
    Outline(Arc<Outline>),
    /// See [`AnalysisKind::CodeStyle`].
    CodeStyle(Arc<CodeStyle>),
}

impl Analysis {
    /// The kind this result belongs to.
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Analysis::Outline(_) => AnalysisKind::Outline,
            Analysis::CodeStyle(_) => AnalysisKind::CodeStyle,
        }
    }

    /// The outline, if this is one.
    pub fn as_outline(&self) -> Option<&Arc<Outline>> {
        match self {
            Analysis::Outline(outline) => Some(outline),
            _ => None,
        }
    }

    /// The code style, if this is one.
    pub fn as_code_style(&self) -> Option<&Arc<CodeStyle>> {
        match self {
            Analysis::CodeStyle(style) => Some(style),
            _ => None,
        }
    }

    /// Returns `true` if both point at the same computed result.
    pub fn ptr_eq(&self, other: &Analysis) -> bool {
        match (self, other) {
            (Analysis::Outline(a), Analysis::Outline(b)) => Arc::ptr_eq(a, b),
            (Analysis::CodeStyle(a), Analysis::CodeStyle(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Computes `kind` for `file` from `artifact`.
///
/// Callers hold the build context scope for the artifact's context.
pub fn compute(kind: AnalysisKind, artifact: &Artifact, file: &FileId) -> Result<Analysis, BuildError> {
    let text = artifact
        .source(file)
        .ok_or_else(|| BuildError::UnknownSource(file.clone()))?;
    Ok(match kind {
        AnalysisKind::Outline => Analysis::Outline(Arc::new(Outline::compute(artifact, file))),
        AnalysisKind::CodeStyle => Analysis::CodeStyle(Arc::new(CodeStyle::measure(text))),
    })
}

/// One declaration in an [`Outline`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OutlineEntry {
    /// Simple name.
    pub name: String,
    /// Dotted name.
    pub qualified_name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// Nesting depth below the root namespace.
    pub depth: usize,
}

/// The declarations of one file, in source order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Outline {
    /// The file described.
    pub file: FileId,
    /// Entries sorted by line, then column.
    pub entries: Vec<OutlineEntry>,
}

impl Outline {
    fn compute(artifact: &Artifact, file: &FileId) -> Self {
        let mut entries: Vec<OutlineEntry> = artifact
            .context()
            .symbols(file)
            .into_iter()
            .map(|symbol| OutlineEntry {
                depth: symbol.depth(),
                name: symbol.name,
                qualified_name: symbol.qualified_name,
                kind: symbol.kind,
                line: symbol.line,
                column: symbol.column,
            })
            .collect();
        entries.sort_by_key(|e| (e.line, e.column));
        Self {
            file: file.clone(),
            entries,
        }
    }

    /// Looks up an entry by qualified name.
    pub fn find(&self, qualified_name: &str) -> Option<&OutlineEntry> {
        self.entries.iter().find(|e| e.qualified_name == qualified_name)
    }
}

/// How a file is indented.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndentStyle {
    /// Tab characters.
    Tabs,
    /// This many spaces per level.
    Spaces(usize),
    /// No indented lines to judge from.
    Unknown,
}

/// Formatting conventions measured from a file's compiled text.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CodeStyle {
    /// Indentation unit.
    pub indent: IndentStyle,
    /// Most common number of spaces between a name and the `(` of a call or
    /// declaration. `None` if the file has no calls.
    pub spaces_before_paren: Option<usize>,
    /// Number of name-paren pairs measured.
    pub samples: usize,
}

/// Words that are followed by `(` but are not calls.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "lock", "return", "sizeof", "typeof", "yield",
];

impl CodeStyle {
    /// Measures the conventions used in `text`.
    pub fn measure(text: &str) -> Self {
        let mut tab_lines = 0usize;
        let mut space_lines = 0usize;
        let mut smallest_indent: Option<usize> = None;
        let mut spacing: BTreeMap<usize, usize> = BTreeMap::new();

        for line in text.lines() {
            let code = line.trim_start();
            if code.is_empty() || code.starts_with("//") || code.starts_with('*') {
                continue;
            }
            if line.starts_with('\t') {
                tab_lines += 1;
            } else {
                let indent = line.len() - code.len();
                if indent > 0 {
                    space_lines += 1;
                    smallest_indent = Some(smallest_indent.map_or(indent, |s| s.min(indent)));
                }
            }
            for gap in paren_gaps(code) {
                *spacing.entry(gap).or_default() += 1;
            }
        }

        let indent = if tab_lines > space_lines {
            IndentStyle::Tabs
        } else {
            smallest_indent.map_or(IndentStyle::Unknown, IndentStyle::Spaces)
        };
        // Ties go to the smaller gap: BTreeMap iterates ascending and
        // max_by_key keeps the last maximum, so iterate in reverse.
        let spaces_before_paren = spacing
            .iter()
            .rev()
            .max_by_key(|(_, count)| **count)
            .map(|(gap, _)| *gap);

        Self {
            indent,
            spaces_before_paren,
            samples: spacing.values().sum(),
        }
    }
}

/// Spaces between each identifier and a following `(` on one line of code,
/// skipping control keywords and anything inside string literals.
fn paren_gaps(code: &str) -> Vec<usize> {
    let bytes = code.as_bytes();
    let mut gaps = Vec::new();
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'"' && (i == 0 || bytes[i - 1] != b'\\') {
            in_string = !in_string;
            continue;
        }
        if in_string || b != b'(' {
            continue;
        }
        let mut end = i;
        while end > 0 && bytes[end - 1] == b' ' {
            end -= 1;
        }
        let mut start = end;
        while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
            start -= 1;
        }
        if start == end || bytes[start].is_ascii_digit() {
            continue;
        }
        if CONTROL_KEYWORDS.contains(&&code[start..end]) {
            continue;
        }
        gaps.push(i - end);
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_and_gnu_spacing() {
        let text = "namespace Demo {\n    void run () {\n        print (\"hi\");\n        if (x) {\n            stop ();\n        }\n    }\n}\n";
        let style = CodeStyle::measure(text);
        assert_eq!(style.indent, IndentStyle::Spaces(4));
        assert_eq!(style.spaces_before_paren, Some(1));
        assert_eq!(style.samples, 3);
    }

    #[test]
    fn tabs_and_tight_spacing() {
        let text = "void main() {\n\tprint(\"a (b)\");\n\tfoo(bar(1));\n}\n";
        let style = CodeStyle::measure(text);
        assert_eq!(style.indent, IndentStyle::Tabs);
        assert_eq!(style.spaces_before_paren, Some(0));
        assert_eq!(style.samples, 4);
    }

    #[test]
    fn tie_prefers_smaller_gap() {
        let style = CodeStyle::measure("a ();\nb();\n");
        assert_eq!(style.spaces_before_paren, Some(0));
        assert_eq!(style.indent, IndentStyle::Unknown);
    }

    #[test]
    fn nothing_to_measure() {
        let style = CodeStyle::measure("// only a comment\n");
        assert_eq!(style.spaces_before_paren, None);
        assert_eq!(style.samples, 0);
    }

    #[test]
    fn control_keywords_skipped() {
        assert_eq!(paren_gaps("while (true) { foreach (var x in y) {} }"), Vec::<usize>::new());
        assert_eq!(paren_gaps("x = (1 + 2);"), Vec::<usize>::new());
    }
}
