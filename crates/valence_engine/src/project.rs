//! A whole workspace: every target and the graph between them.

use crate::analysis::{Analysis, AnalysisKind};
use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::frontend::Frontend;
use crate::graph::DependencyGraph;
use crate::target::{BuildStatus, BuildTarget};
use crate::task::BuildTask;
use crate::unit::CompilationUnit;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use valence_config::{load_project, ProjectDescription};
use valence_source::FileId;

/// Either kind of build target.
#[derive(Debug)]
pub enum Target {
    /// A compilation unit.
    Unit(CompilationUnit),
    /// A build task.
    Task(BuildTask),
}

impl Target {
    fn as_dyn(&self) -> &dyn BuildTarget {
        match self {
            Target::Unit(unit) => unit,
            Target::Task(task) => task,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn BuildTarget {
        match self {
            Target::Unit(unit) => unit,
            Target::Task(task) => task,
        }
    }
}

/// All targets of one workspace.
///
/// Callers sharing a project between threads wrap it in a mutex; builds and
/// document edits both need `&mut self`.
pub struct Project {
    name: String,
    root: PathBuf,
    targets: BTreeMap<String, Target>,
    graph: DependencyGraph,
}

impl Project {
    /// Loads `valence.toml` from `root`.
    pub fn load(root: &Path, frontend: Arc<dyn Frontend>) -> Result<Self, BuildError> {
        let desc = load_project(root)?;
        Self::from_description(&desc, frontend)
    }

    /// Creates every target in `desc` and wires producers to consumers.
    pub fn from_description(
        desc: &ProjectDescription,
        frontend: Arc<dyn Frontend>,
    ) -> Result<Self, BuildError> {
        let mut targets = BTreeMap::new();
        for unit in &desc.units {
            let unit = CompilationUnit::new(unit, Arc::clone(&frontend));
            targets.insert(unit.id().to_string(), Target::Unit(unit));
        }
        for task in &desc.tasks {
            let task = BuildTask::new(task);
            targets.insert(task.id().to_string(), Target::Task(task));
        }

        let mut graph = DependencyGraph::new();
        for (id, target) in &targets {
            graph.add_target(id, target.as_dyn().info().outputs.iter().cloned())?;
        }

        let mut project = Self {
            name: desc.name.clone(),
            root: desc.root.clone(),
            targets,
            graph,
        };
        let ids: Vec<String> = project.targets.keys().cloned().collect();
        for id in ids {
            project.wire(&id)?;
        }
        log::info!(
            "loaded project '{}' with {} targets",
            project.name,
            project.targets.len()
        );
        Ok(project)
    }

    /// Links `id`'s inputs to the targets producing them.
    fn wire(&mut self, id: &str) -> Result<(), BuildError> {
        let inputs: Vec<FileId> = self
            .target(id)?
            .as_dyn()
            .info()
            .inputs
            .iter()
            .cloned()
            .collect();
        let links = self.graph.connect(id, &inputs)?;
        for (file, producer) in links {
            let stamp = self.target(&producer)?.as_dyn().info().stamp().clone();
            let consumer = self.target_mut(id)?;
            if let Target::Unit(unit) = &mut *consumer {
                unit.mark_generated(&file);
            }
            log::debug!("'{id}' reads {file} from '{producer}'");
            consumer.as_dyn_mut().info_mut().add_dependency(file, producer, stamp);
        }
        Ok(())
    }

    /// Project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Every target id, sorted.
    pub fn target_ids(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// A compilation unit by id.
    pub fn unit(&self, id: &str) -> Option<&CompilationUnit> {
        match self.targets.get(id)? {
            Target::Unit(unit) => Some(unit),
            Target::Task(_) => None,
        }
    }

    /// A compilation unit by id, mutably.
    pub fn unit_mut(&mut self, id: &str) -> Option<&mut CompilationUnit> {
        match self.targets.get_mut(id)? {
            Target::Unit(unit) => Some(unit),
            Target::Task(_) => None,
        }
    }

    /// A build task by id.
    pub fn task(&self, id: &str) -> Option<&BuildTask> {
        match self.targets.get(id)? {
            Target::Task(task) => Some(task),
            Target::Unit(_) => None,
        }
    }

    /// Builds `id` after every target it transitively depends on.
    pub fn build_target(&mut self, id: &str, cancel: &CancelToken) -> Result<BuildStatus, BuildError> {
        self.target(id)?;
        let order = self.graph.build_order()?;
        let needed: BTreeSet<String> = self
            .graph
            .ancestors_of(id)?
            .into_iter()
            .map(str::to_string)
            .collect();
        for dep in order.iter().filter(|t| needed.contains(*t)) {
            self.target_mut(dep)?.as_dyn_mut().build_if_stale(cancel)?;
        }
        self.target_mut(id)?.as_dyn_mut().build_if_stale(cancel)
    }

    /// Brings every target up to date, producers first.
    ///
    /// A failing target does not stop the others, except those that depend
    /// on it. The first error is returned once everything else has been
    /// attempted. Cancellation stops immediately.
    pub fn rebuild_if_stale(
        &mut self,
        cancel: &CancelToken,
    ) -> Result<Vec<(String, BuildStatus)>, BuildError> {
        let order = self.graph.build_order()?;
        let mut results = Vec::new();
        let mut failed: BTreeSet<String> = BTreeSet::new();
        let mut first_error = None;

        for id in order {
            cancel.check()?;
            let blocked = self
                .graph
                .dependencies_of(&id)?
                .into_iter()
                .find(|dep| failed.contains(*dep))
                .map(str::to_string);
            if let Some(dep) = blocked {
                log::warn!("skipping '{id}': dependency '{dep}' failed");
                failed.insert(id);
                continue;
            }
            match self.target_mut(&id)?.as_dyn_mut().build_if_stale(cancel) {
                Ok(status) => results.push((id, status)),
                Err(BuildError::Cancelled) => return Err(BuildError::Cancelled),
                Err(e) => {
                    log::warn!("target '{id}' failed: {e}");
                    failed.insert(id);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }

    /// Returns an analysis of `file` from unit `unit`.
    pub fn get_analysis(
        &mut self,
        unit: &str,
        kind: AnalysisKind,
        file: &FileId,
    ) -> Result<Analysis, BuildError> {
        self.unit_mut(unit)
            .ok_or_else(|| BuildError::UnknownTarget(unit.to_string()))?
            .get_analysis(kind, file)
    }

    /// Ids of the units that read `file`.
    pub fn units_containing(&self, file: &FileId) -> Vec<&str> {
        self.targets
            .iter()
            .filter_map(|(id, target)| match target {
                Target::Unit(unit) if unit.info().inputs.contains(file) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Applies an edit to `file` in every unit that reads it. Returns how many
    /// units were updated.
    ///
    /// Either every owning unit takes the edit or none does.
    pub fn update_document(&mut self, file: &FileId, text: &str) -> Result<usize, BuildError> {
        let mut owners: Vec<&mut CompilationUnit> = self
            .targets
            .values_mut()
            .filter_map(|target| match target {
                Target::Unit(unit) if unit.info().inputs.contains(file) => Some(unit),
                _ => None,
            })
            .collect();
        if owners.is_empty() {
            return Err(BuildError::UnknownSource(file.clone()));
        }
        for unit in owners.iter_mut() {
            unit.check_editable(file)?;
        }
        for unit in owners.iter_mut() {
            unit.update_document(file, text)?;
        }
        Ok(owners.len())
    }

    /// Removes a target. Its dependents keep the files as plain inputs.
    pub fn remove_target(&mut self, id: &str) -> Result<Target, BuildError> {
        let removed = self
            .targets
            .remove(id)
            .ok_or_else(|| BuildError::UnknownTarget(id.to_string()))?;
        self.graph.remove_target(id);
        for target in self.targets.values_mut() {
            target.as_dyn_mut().info_mut().remove_dependencies_on(id);
        }
        log::info!("removed target '{id}'");
        Ok(removed)
    }

    fn target(&self, id: &str) -> Result<&Target, BuildError> {
        self.targets
            .get(id)
            .ok_or_else(|| BuildError::UnknownTarget(id.to_string()))
    }

    fn target_mut(&mut self, id: &str) -> Result<&mut Target, BuildError> {
        self.targets
            .get_mut(id)
            .ok_or_else(|| BuildError::UnknownTarget(id.to_string()))
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .finish()
    }
}
