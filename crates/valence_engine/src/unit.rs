//! Compilation units: sources plus flags, compiled into one artifact.
//!
//! A unit moves through three states. A fresh unit has no documents. The
//! first `configure` loads them from disk and prepares a *working* context.
//! A successful `compile` promotes the working context into a published
//! [`Artifact`], which is replaced wholesale on every later compile and never
//! modified in place. Analyses are cached against the artifact and served
//! until the next successful compile.

use crate::analysis::{self, Analysis, AnalysisKind};
use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::frontend::{Context, Frontend};
use crate::scope::{self, ContextId};
use crate::symbol_index::SymbolIndex;
use crate::target::{BuildStatus, BuildTarget, TargetInfo};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use valence_cache::AnalysisCache;
use valence_common::Timestamp;
use valence_config::{
    collect_sources, parse_arguments, ArgumentBase, BuildConfiguration, OutputTargets,
    UnitDescription,
};
use valence_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use valence_source::{FileId, Location, ParsePhase, SourceDocument};

/// The published result of a successful compile.
pub struct Artifact {
    id: ContextId,
    context: Box<dyn Context>,
    sources: BTreeMap<FileId, Arc<str>>,
    reporter: Arc<DiagnosticSink>,
    built_at: Timestamp,
}

impl Artifact {
    /// The context id, for entering the build context scope.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// The frontend context. Enter the scope for [`id`](Self::id) before
    /// calling into it.
    pub fn context(&self) -> &dyn Context {
        self.context.as_ref()
    }

    /// The text of `file` as it was compiled.
    pub fn source(&self, file: &FileId) -> Option<&Arc<str>> {
        self.sources.get(file)
    }

    /// Returns `true` if `file` was compiled into this artifact.
    pub fn contains(&self, file: &FileId) -> bool {
        self.sources.contains_key(file)
    }

    /// Every compiled file, sorted.
    pub fn files(&self) -> impl Iterator<Item = &FileId> {
        self.sources.keys()
    }

    /// Diagnostics reported while compiling.
    pub fn reporter(&self) -> &Arc<DiagnosticSink> {
        &self.reporter
    }

    /// When the compile finished.
    pub fn built_at(&self) -> Timestamp {
        self.built_at
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("id", &self.id)
            .field("files", &self.sources.len())
            .field("built_at", &self.built_at)
            .finish()
    }
}

/// What one successful compile produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Error diagnostics reported.
    pub errors: usize,
    /// Warning diagnostics reported.
    pub warnings: usize,
    /// Output files written.
    pub written_outputs: Vec<PathBuf>,
    /// Output files that could not be written, with the reason.
    pub failed_outputs: Vec<(PathBuf, String)>,
    /// Output files the frontend cannot produce.
    pub unsupported_outputs: Vec<PathBuf>,
    /// Set when `--fatal-warnings` suppressed every output.
    pub outputs_suppressed: bool,
    /// Files whose cached analyses were dropped because they left the unit.
    pub pruned_files: Vec<FileId>,
}

/// A context prepared by `configure` and not yet compiled.
struct WorkingContext {
    id: ContextId,
    context: Box<dyn Context>,
    reporter: Arc<DiagnosticSink>,
}

/// Why a unit needs rebuilding.
enum Staleness {
    NeverBuilt,
    Arguments,
    Dependency(String),
    Document(FileId),
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::NeverBuilt => write!(f, "never built"),
            Staleness::Arguments => write!(f, "arguments changed"),
            Staleness::Dependency(target) => write!(f, "dependency '{target}' rebuilt"),
            Staleness::Document(file) => write!(f, "{file} changed"),
        }
    }
}

/// A set of sources compiled together with one set of flags.
pub struct CompilationUnit {
    info: TargetInfo,
    frontend: Arc<dyn Frontend>,
    source_dir: PathBuf,
    arguments: Vec<String>,
    configuration: Option<BuildConfiguration>,
    project_sources: BTreeMap<FileId, SourceDocument>,
    generated_sources: BTreeSet<FileId>,
    generated_documents: BTreeMap<FileId, SourceDocument>,
    documents_loaded: bool,
    arguments_changed: bool,
    working: Option<WorkingContext>,
    artifact: Option<Arc<Artifact>>,
    analysis_cache: AnalysisCache<AnalysisKind, Analysis>,
    symbol_index: SymbolIndex,
    reporter: Arc<DiagnosticSink>,
}

impl CompilationUnit {
    /// Creates a unit from its description. Nothing is read from disk yet.
    ///
    /// Inputs come from the positional arguments alone, so a unit with an
    /// invalid flag still knows its sources. Outputs come from a trial parse
    /// of the arguments and are empty if that fails.
    pub fn new(desc: &UnitDescription, frontend: Arc<dyn Frontend>) -> Self {
        let mut info = TargetInfo::new(&desc.id, &desc.name, &desc.output_dir);
        info.inputs = collect_sources(&desc.arguments, &desc.source_dir)
            .into_iter()
            .collect();
        let base = ArgumentBase {
            source_dir: &desc.source_dir,
            output_dir: &desc.output_dir,
        };
        match parse_arguments(&desc.arguments, &base) {
            Ok(parsed) => info.outputs = output_files(&parsed.configuration.outputs),
            Err(e) => log::warn!("unit '{}': {e}", desc.id),
        }
        let generated_sources = info
            .inputs
            .iter()
            .filter(|f| desc.generated.contains(f.path()))
            .cloned()
            .collect();

        Self {
            info,
            frontend,
            source_dir: desc.source_dir.clone(),
            arguments: desc.arguments.clone(),
            configuration: None,
            project_sources: BTreeMap::new(),
            generated_sources,
            generated_documents: BTreeMap::new(),
            documents_loaded: false,
            arguments_changed: false,
            working: None,
            artifact: None,
            analysis_cache: AnalysisCache::new(),
            symbol_index: SymbolIndex::new(),
            reporter: Arc::new(DiagnosticSink::new()),
        }
    }

    /// The raw argument list.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Replaces the argument list and marks the unit stale. Documents for
    /// files that are no longer inputs are dropped; new inputs are read on
    /// the next build.
    pub fn set_arguments(&mut self, arguments: Vec<String>) {
        let inputs: BTreeSet<FileId> = collect_sources(&arguments, &self.source_dir)
            .into_iter()
            .collect();
        let base = ArgumentBase {
            source_dir: &self.source_dir,
            output_dir: &self.info.output_dir,
        };
        if let Ok(parsed) = parse_arguments(&arguments, &base) {
            self.info.outputs = output_files(&parsed.configuration.outputs);
        }
        self.project_sources.retain(|f, _| inputs.contains(f));
        self.generated_documents.retain(|f, _| inputs.contains(f));
        self.generated_sources.retain(|f| inputs.contains(f));
        self.info.inputs = inputs;
        self.arguments = arguments;
        self.documents_loaded = false;
        self.arguments_changed = true;
    }

    /// The configuration from the last successful `configure`.
    pub fn configuration(&self) -> Option<&BuildConfiguration> {
        self.configuration.as_ref()
    }

    /// Inputs that only exist once another step has produced them.
    pub fn generated_sources(&self) -> &BTreeSet<FileId> {
        &self.generated_sources
    }

    /// Declares that `file` is produced by another target. It is read right
    /// before each compile rather than when documents are first loaded, and
    /// reread on every staleness check once loaded.
    pub fn mark_generated(&mut self, file: &FileId) {
        if !self.info.inputs.contains(file) {
            return;
        }
        self.generated_sources.insert(file.clone());
        if let Some(doc) = self.project_sources.remove(file) {
            self.generated_documents.insert(file.clone(), doc);
        }
    }

    /// Prepares a fresh working context.
    ///
    /// On failure the unit keeps its previous artifact and working context.
    pub fn configure(&mut self) -> Result<(), BuildError> {
        let base = ArgumentBase {
            source_dir: &self.source_dir,
            output_dir: &self.info.output_dir,
        };
        let config = parse_arguments(&self.arguments, &base)?.configuration;

        let id = ContextId::fresh();
        let _scope = scope::enter(id)?;
        let reporter = Arc::new(DiagnosticSink::new());
        let mut context = self.frontend.create_context(&config, Arc::clone(&reporter));

        self.load_documents();
        let default_import = config.profile.default_import();
        context.add_default_import(default_import);
        for doc in self.project_sources.values_mut() {
            doc.clear_annotations();
            doc.add_default_import(default_import);
            context.add_source(doc);
        }
        for package in &config.packages {
            if !context.add_package(package) {
                reporter.emit(Diagnostic::warning(format!("package `{package}` not found")));
            }
        }

        log::debug!(
            "configured unit '{}' as {id} ({} sources, {} packages)",
            self.info.id,
            self.project_sources.len(),
            config.packages.len()
        );
        self.configuration = Some(config);
        self.working = Some(WorkingContext {
            id,
            context,
            reporter,
        });
        Ok(())
    }

    /// Compiles the working context and publishes the result.
    ///
    /// Generated sources are read before the context is touched, so a
    /// missing one leaves the working context in place for a retry.
    pub fn compile(&mut self, cancel: &CancelToken) -> Result<CompileReport, BuildError> {
        let id = self.working.as_ref().ok_or(BuildError::NotConfigured)?.id;
        let config = self.configuration.clone().ok_or(BuildError::NotConfigured)?;
        let _scope = scope::enter(id)?;

        self.materialize_generated(cancel)?;

        let WorkingContext {
            id,
            mut context,
            reporter,
        } = self.working.take().ok_or(BuildError::NotConfigured)?;
        self.reporter = Arc::clone(&reporter);

        let default_import = config.profile.default_import();
        for doc in self.generated_documents.values_mut() {
            doc.clear_annotations();
            doc.add_default_import(default_import);
            context.add_source(doc);
        }
        for phase in ParsePhase::ALL {
            context.parse(phase);
        }
        context.check();

        let mut report = CompileReport {
            errors: reporter.error_count(),
            warnings: reporter.warning_count(),
            ..CompileReport::default()
        };
        let fatal = config.features.fatal_warnings
            && reporter
                .diagnostics()
                .iter()
                .any(|d| d.severity.is_warning_or_worse());
        if fatal {
            log::info!(
                "unit '{}': not writing outputs, {} errors and {} warnings with --fatal-warnings",
                self.info.id,
                report.errors,
                report.warnings
            );
            report.outputs_suppressed = !config.outputs.is_empty();
        } else {
            write_outputs(context.as_ref(), &config.outputs, &mut report);
        }

        self.symbol_index = SymbolIndex::build(context.as_ref());
        let sources: BTreeMap<FileId, Arc<str>> = self
            .project_sources
            .values_mut()
            .chain(self.generated_documents.values_mut())
            .map(|doc| (doc.file().clone(), doc.snapshot()))
            .collect();
        if log::log_enabled!(log::Level::Debug) {
            let renderer = TerminalRenderer::new(true);
            for diag in reporter.diagnostics() {
                let text = diag.location.as_ref().and_then(|loc| sources.get(&loc.file));
                log::debug!("{}", renderer.render(&diag, text.map(|t| &**t)).trim_end());
            }
        }

        let built_at = self.info.mark_built();
        self.arguments_changed = false;
        let live: BTreeSet<FileId> = sources.keys().cloned().collect();
        let diff = self.analysis_cache.retain_files(&live);
        report.pruned_files = diff.removed;
        self.artifact = Some(Arc::new(Artifact {
            id,
            context,
            sources,
            reporter,
            built_at,
        }));

        log::info!(
            "compiled unit '{}' at {built_at}: {} errors, {} warnings",
            self.info.id,
            report.errors,
            report.warnings
        );
        Ok(report)
    }

    /// Returns `kind` for `file`, from the cache when it is still valid.
    pub fn get_analysis(&mut self, kind: AnalysisKind, file: &FileId) -> Result<Analysis, BuildError> {
        let artifact = self.artifact.clone().ok_or(BuildError::NotBuilt)?;
        if !artifact.contains(file) {
            return Err(BuildError::UnknownSource(file.clone()));
        }
        let valid_since = self.info.last_updated();
        self.analysis_cache
            .get_or_insert_with(file, kind, valid_since, || {
                let _scope = scope::enter(artifact.id())?;
                analysis::compute(kind, &artifact, file)
            })
    }

    /// The unit's own (non-generated) documents.
    pub fn get_project_sources(&self) -> impl Iterator<Item = &SourceDocument> {
        self.project_sources.values()
    }

    /// Returns `true` if `file` is one of the unit's loaded documents.
    pub fn lookup_source(&self, file: &FileId) -> bool {
        self.project_sources.contains_key(file) || self.generated_documents.contains_key(file)
    }

    /// A loaded document.
    pub fn document(&self, file: &FileId) -> Option<&SourceDocument> {
        self.project_sources
            .get(file)
            .or_else(|| self.generated_documents.get(file))
    }

    /// Checks that `file` can be edited through
    /// [`update_document`](Self::update_document). Loads documents but
    /// changes nothing else.
    pub fn check_editable(&mut self, file: &FileId) -> Result<(), BuildError> {
        self.load_documents();
        if self.generated_sources.contains(file) {
            return Err(BuildError::GeneratedSource(file.clone()));
        }
        if !self.project_sources.contains_key(file) {
            return Err(BuildError::UnknownSource(file.clone()));
        }
        Ok(())
    }

    /// Replaces the live text of a project source. The unit becomes stale.
    ///
    /// Generated sources are rejected: their text always comes from disk.
    pub fn update_document(&mut self, file: &FileId, text: impl Into<String>) -> Result<(), BuildError> {
        self.check_editable(file)?;
        let doc = self
            .project_sources
            .get_mut(file)
            .ok_or_else(|| BuildError::UnknownSource(file.clone()))?;
        doc.update(text.into());
        Ok(())
    }

    /// Diagnostics from the last compile attempt.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.reporter.diagnostics()
    }

    /// The published artifact, if any compile succeeded.
    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        self.artifact.as_ref()
    }

    /// Finds the declaration that generated a C symbol.
    pub fn lookup_symbol_by_c_name(&self, c_name: &str) -> Option<&Location> {
        self.symbol_index.lookup(c_name)
    }

    /// Number of cached analyses.
    pub fn cached_analyses(&self) -> usize {
        self.analysis_cache.len()
    }

    /// Forgets documents, contexts, cached analyses and the build stamp. The
    /// next build starts over from the inputs on disk.
    pub fn reset(&mut self) {
        self.project_sources.clear();
        self.generated_documents.clear();
        self.documents_loaded = false;
        self.arguments_changed = false;
        self.configuration = None;
        self.working = None;
        self.artifact = None;
        self.analysis_cache.clear();
        self.symbol_index = SymbolIndex::new();
        self.reporter = Arc::new(DiagnosticSink::new());
        self.info.clear_built();
        log::debug!("reset unit '{}'", self.info.id);
    }

    /// Loads every non-generated input once. Unreadable inputs are skipped.
    fn load_documents(&mut self) {
        if self.documents_loaded {
            return;
        }
        for file in &self.info.inputs {
            if self.generated_sources.contains(file) || self.project_sources.contains_key(file) {
                continue;
            }
            match SourceDocument::load(file.clone()) {
                Ok(doc) => {
                    self.project_sources.insert(file.clone(), doc);
                }
                Err(e) => log::warn!("unit '{}': cannot read {file}: {e}", self.info.id),
            }
        }
        self.documents_loaded = true;
    }

    /// Reads every generated input, reloading ones whose bytes changed.
    fn materialize_generated(&mut self, cancel: &CancelToken) -> Result<(), BuildError> {
        for file in &self.generated_sources {
            cancel.check()?;
            let missing = || BuildError::MissingGeneratedSource {
                path: file.path().to_path_buf(),
            };
            match self.generated_documents.get_mut(file) {
                Some(doc) => match doc.reload() {
                    Ok(true) => log::debug!("generated source {file} changed"),
                    Ok(false) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(missing()),
                    Err(e) => return Err(BuildError::io(file.path(), e)),
                },
                None => match SourceDocument::load(file.clone()) {
                    Ok(doc) => {
                        self.generated_documents.insert(file.clone(), doc);
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(missing()),
                    Err(e) => return Err(BuildError::io(file.path(), e)),
                },
            }
        }
        Ok(())
    }

    /// Rereads the generated sources loaded by earlier compiles, so a file
    /// rewritten by a step outside the project makes the unit stale. Read
    /// failures are left for `compile` to report.
    fn refresh_generated(&mut self) {
        for (file, doc) in &mut self.generated_documents {
            match doc.reload() {
                Ok(true) => log::debug!("generated source {file} changed on disk"),
                Ok(false) => {}
                Err(e) => log::debug!("cannot reread generated source {file}: {e}"),
            }
        }
    }

    fn staleness(&self) -> Option<Staleness> {
        let ours = self.info.last_updated();
        if ours.is_none() {
            return Some(Staleness::NeverBuilt);
        }
        if self.arguments_changed {
            return Some(Staleness::Arguments);
        }
        if let Some(dep) = self.info.newer_dependency() {
            return Some(Staleness::Dependency(dep.target.clone()));
        }
        self.project_sources
            .values()
            .chain(self.generated_documents.values())
            .find(|doc| doc.last_updated().is_newer_than(ours))
            .map(|doc| Staleness::Document(doc.file().clone()))
    }
}

impl BuildTarget for CompilationUnit {
    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut TargetInfo {
        &mut self.info
    }

    fn build_if_stale(&mut self, cancel: &CancelToken) -> Result<BuildStatus, BuildError> {
        cancel.check()?;
        self.load_documents();
        self.refresh_generated();
        let Some(reason) = self.staleness() else {
            return Ok(BuildStatus::UpToDate);
        };
        log::debug!("unit '{}' is stale: {reason}", self.info.id);
        self.configure()?;
        cancel.check()?;
        let report = self.compile(cancel)?;
        Ok(BuildStatus::Rebuilt(report))
    }
}

impl fmt::Debug for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationUnit")
            .field("id", &self.info.id)
            .field("inputs", &self.info.inputs.len())
            .field("last_updated", &self.info.last_updated())
            .field("artifact", &self.artifact)
            .finish()
    }
}

fn output_files(outputs: &OutputTargets) -> BTreeSet<FileId> {
    [
        &outputs.interface,
        &outputs.introspection,
        &outputs.internal_interface,
    ]
    .into_iter()
    .flatten()
    .map(FileId::new)
    .collect()
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn record_output(report: &mut CompileReport, path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => report.written_outputs.push(path.to_path_buf()),
        Err(e) => {
            log::warn!("failed to write {}: {e}", path.display());
            report.failed_outputs.push((path.to_path_buf(), e.to_string()));
        }
    }
}

/// Writes each configured output. A failure is recorded and does not stop
/// the others.
fn write_outputs(context: &dyn Context, outputs: &OutputTargets, report: &mut CompileReport) {
    if let Some(path) = &outputs.interface {
        let result = ensure_parent(path).and_then(|()| context.write_interface(path));
        record_output(report, path, result);
    }
    if let Some(path) = &outputs.internal_interface {
        let result = ensure_parent(path).and_then(|()| context.write_internal_interface(path));
        record_output(report, path, result);
    }
    if let Some(path) = &outputs.introspection {
        if let Err(e) = ensure_parent(path) {
            record_output(report, path, Err(e));
        } else if let Some(result) = context.write_introspection(path) {
            record_output(report, path, result);
        } else {
            log::warn!(
                "frontend cannot write introspection data; skipping {}",
                path.display()
            );
            report.unsupported_outputs.push(path.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_files_lists_configured_paths() {
        let outputs = OutputTargets {
            interface: Some(PathBuf::from("/out/app.vapi")),
            introspection: None,
            internal_interface: Some(PathBuf::from("/out/../out/app-internal.vapi")),
        };
        let files = output_files(&outputs);
        assert_eq!(files.len(), 2);
        assert!(files.contains(&FileId::new("/out/app.vapi")));
        assert!(files.contains(&FileId::new("/out/app-internal.vapi")));
        assert!(output_files(&OutputTargets::default()).is_empty());
    }

    #[test]
    fn ensure_parent_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.vapi");
        ensure_parent(&path).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        ensure_parent(Path::new("bare.vapi")).unwrap();
    }

    #[test]
    fn record_output_splits_results() {
        let mut report = CompileReport::default();
        record_output(&mut report, Path::new("/ok.vapi"), Ok(()));
        record_output(
            &mut report,
            Path::new("/bad.vapi"),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
        );
        assert_eq!(report.written_outputs, [PathBuf::from("/ok.vapi")]);
        assert_eq!(report.failed_outputs.len(), 1);
        assert_eq!(report.failed_outputs[0].0, PathBuf::from("/bad.vapi"));
        assert!(report.failed_outputs[0].1.contains("denied"));
    }

    #[test]
    fn staleness_reasons() {
        assert_eq!(Staleness::NeverBuilt.to_string(), "never built");
        assert_eq!(Staleness::Arguments.to_string(), "arguments changed");
        assert_eq!(
            Staleness::Dependency("lib".to_string()).to_string(),
            "dependency 'lib' rebuilt"
        );
        assert_eq!(
            Staleness::Document(FileId::new("/p/main.vala")).to_string(),
            "/p/main.vala changed"
        );
    }
}
