//! A recording frontend for engine tests.
//!
//! Declarations are recognized line by line: `namespace X {`, `class X {` and
//! `void x () {` open a scope, a line starting with `}` closes one. Lines
//! containing `#error`, `#warning` or `#deprecated` produce a diagnostic of
//! that severity.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use valence_config::{BuildConfiguration, UnitDescription};
use valence_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use valence_engine::scope::{self, ContextId};
use valence_engine::{CancelToken, Context, Frontend, SymbolInfo, SymbolKind};
use valence_source::{FileId, Location, ParsePhase, SourceDocument, SourceKind};

pub const MAIN_VALA: &str = "\
namespace Demo {
    class App {
        void run () {
            print (\"hi\");
        }
    }
}
";

/// What the frontend saw, across every context it created.
#[derive(Debug, Default)]
pub struct Stats {
    pub contexts: usize,
    pub checks: usize,
    pub root_imports: Vec<String>,
    pub packages: Vec<String>,
    pub registered: Vec<FileId>,
    pub scope_during_check: Vec<Option<ContextId>>,
}

#[derive(Default)]
pub struct MockFrontend {
    stats: Arc<Mutex<Stats>>,
    missing_packages: BTreeSet<String>,
    introspection: bool,
    cancel_on_create: Option<CancelToken>,
}

impl MockFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_package(mut self, name: &str) -> Self {
        self.missing_packages.insert(name.to_string());
        self
    }

    pub fn with_introspection(mut self) -> Self {
        self.introspection = true;
        self
    }

    /// Cancels `token` whenever a context is created.
    pub fn cancelling(mut self, token: &CancelToken) -> Self {
        self.cancel_on_create = Some(token.clone());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn contexts(&self) -> usize {
        self.stats.lock().contexts
    }

    pub fn checks(&self) -> usize {
        self.stats.lock().checks
    }

    pub fn stats(&self) -> parking_lot::MutexGuard<'_, Stats> {
        self.stats.lock()
    }
}

impl Frontend for MockFrontend {
    fn create_context(
        &self,
        config: &BuildConfiguration,
        reporter: Arc<DiagnosticSink>,
    ) -> Box<dyn Context> {
        {
            let mut stats = self.stats.lock();
            stats.contexts += 1;
            stats.root_imports.clear();
            stats.packages.clear();
            stats.registered.clear();
        }
        if let Some(token) = &self.cancel_on_create {
            token.cancel();
        }
        Box::new(MockContext {
            stats: Arc::clone(&self.stats),
            reporter,
            missing_packages: self.missing_packages.clone(),
            introspection: self.introspection,
            packages: config.packages.iter().cloned().collect(),
            sources: BTreeMap::new(),
            symbols: BTreeMap::new(),
        })
    }
}

struct MockContext {
    stats: Arc<Mutex<Stats>>,
    reporter: Arc<DiagnosticSink>,
    missing_packages: BTreeSet<String>,
    introspection: bool,
    packages: Vec<String>,
    sources: BTreeMap<FileId, (SourceKind, String)>,
    symbols: BTreeMap<FileId, Vec<SymbolInfo>>,
}

impl MockContext {
    fn describe(&self, header: &str) -> String {
        let mut out = format!("// {header}\n");
        for symbol in self.symbols.values().flatten() {
            out.push_str(&symbol.qualified_name);
            out.push('\n');
        }
        out
    }
}

impl Context for MockContext {
    fn add_package(&mut self, name: &str) -> bool {
        self.stats.lock().packages.push(name.to_string());
        !self.missing_packages.contains(name)
    }

    fn add_default_import(&mut self, namespace: &str) {
        self.stats.lock().root_imports.push(namespace.to_string());
    }

    fn add_source(&mut self, source: &SourceDocument) {
        self.stats.lock().registered.push(source.file().clone());
        self.sources.insert(
            source.file().clone(),
            (source.kind(), source.content().to_string()),
        );
    }

    fn parse(&mut self, phase: ParsePhase) {
        for (file, (kind, text)) in &self.sources {
            if kind.phase() == phase {
                self.symbols.insert(file.clone(), extract_symbols(text));
            }
        }
    }

    fn check(&mut self) {
        for (file, (_, text)) in &self.sources {
            for (i, line) in text.lines().enumerate() {
                let severity = if line.contains("#error") {
                    Severity::Error
                } else if line.contains("#warning") {
                    Severity::Warning
                } else if line.contains("#deprecated") {
                    Severity::Deprecated
                } else {
                    continue;
                };
                let location = Location::new(file.clone(), i as u32 + 1, 1);
                self.reporter
                    .emit(Diagnostic::new(severity, line.trim()).at(location));
            }
        }
        let mut stats = self.stats.lock();
        stats.checks += 1;
        stats.scope_during_check.push(scope::current());
    }

    fn source_files(&self) -> Vec<FileId> {
        let mut files: Vec<FileId> = self.sources.keys().cloned().collect();
        files.extend(
            self.packages
                .iter()
                .map(|p| FileId::new(format!("/usr/share/vala/vapi/{p}.vapi"))),
        );
        files
    }

    fn symbols(&self, file: &FileId) -> Vec<SymbolInfo> {
        self.symbols.get(file).cloned().unwrap_or_default()
    }

    fn write_interface(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.describe("public interface"))
    }

    fn write_internal_interface(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.describe("internal interface"))
    }

    fn write_introspection(&self, path: &Path) -> Option<io::Result<()>> {
        self.introspection
            .then(|| fs::write(path, self.describe("introspection")))
    }
}

fn extract_symbols(text: &str) -> Vec<SymbolInfo> {
    const DECLARATIONS: [(&str, SymbolKind); 3] = [
        ("namespace ", SymbolKind::Namespace),
        ("class ", SymbolKind::Class),
        ("void ", SymbolKind::Method),
    ];
    let mut scope: Vec<String> = Vec::new();
    let mut symbols = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('}') {
            scope.pop();
            continue;
        }
        let Some((kind, rest)) = DECLARATIONS
            .iter()
            .find_map(|(kw, kind)| trimmed.strip_prefix(*kw).map(|rest| (*kind, rest)))
        else {
            continue;
        };
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let mut path = scope.clone();
        path.push(name.clone());
        symbols.push(SymbolInfo {
            name: name.clone(),
            qualified_name: path.join("."),
            kind,
            c_name: Some(
                path.iter()
                    .map(|p| p.to_lowercase())
                    .collect::<Vec<_>>()
                    .join("_"),
            ),
            line: i as u32 + 1,
            column: (line.len() - trimmed.len()) as u32 + 1,
        });
        if trimmed.ends_with('{') {
            scope.push(name);
        }
    }
    symbols
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Writes `text` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

pub fn file(root: &Path, rel: &str) -> FileId {
    FileId::resolve(root, rel)
}

/// A unit rooted at `root` with outputs under `root/build/<id>`.
pub fn unit_desc(root: &Path, id: &str, args: &[&str]) -> UnitDescription {
    UnitDescription {
        id: id.to_string(),
        name: id.to_string(),
        source_dir: root.to_path_buf(),
        output_dir: root.join("build").join(id),
        arguments: args.iter().map(|a| a.to_string()).collect(),
        generated: BTreeSet::new(),
    }
}
