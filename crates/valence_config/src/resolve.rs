//! Resolution of a project file into absolute, ready-to-build descriptions.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use valence_source::normalize_path;

/// A whole project: every unit and task with paths resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescription {
    /// Project name.
    pub name: String,
    /// Project root directory.
    pub root: PathBuf,
    /// Build directory.
    pub build_dir: PathBuf,
    /// Compilation units, ordered by id.
    pub units: Vec<UnitDescription>,
    /// Build tasks, ordered by id.
    pub tasks: Vec<TaskDescription>,
}

/// Everything needed to create a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescription {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base for relative paths in `arguments`.
    pub source_dir: PathBuf,
    /// Default output directory.
    pub output_dir: PathBuf,
    /// Compiler-style arguments.
    pub arguments: Vec<String>,
    /// Inputs known to be produced by another step.
    pub generated: BTreeSet<PathBuf>,
}

/// Everything needed to create a build task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescription {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Working directory.
    pub output_dir: PathBuf,
    /// Program and arguments.
    pub command: Vec<String>,
    /// Files read by the command.
    pub inputs: Vec<PathBuf>,
    /// Files written by the command.
    pub outputs: Vec<PathBuf>,
}

fn absolute(base: &Path, path: &str) -> PathBuf {
    normalize_path(&base.join(path))
}

/// Resolves a parsed `valence.toml` against the project root.
pub fn resolve_project(config: &ProjectConfig, root: &Path) -> Result<ProjectDescription, ConfigError> {
    let root = normalize_path(root);
    let build_dir = absolute(&root, &config.project.build_dir);

    let units = config
        .units
        .iter()
        .map(|(id, unit)| UnitDescription {
            id: id.clone(),
            name: unit.name.clone().unwrap_or_else(|| id.clone()),
            source_dir: root.clone(),
            output_dir: unit
                .output_dir
                .as_deref()
                .map(|d| absolute(&root, d))
                .unwrap_or_else(|| build_dir.join(id)),
            arguments: unit.args.clone(),
            generated: unit.generated.iter().map(|g| absolute(&root, g)).collect(),
        })
        .collect();

    let tasks = config
        .tasks
        .iter()
        .map(|(id, task)| TaskDescription {
            id: id.clone(),
            name: task.name.clone().unwrap_or_else(|| id.clone()),
            output_dir: task
                .output_dir
                .as_deref()
                .map(|d| absolute(&root, d))
                .unwrap_or_else(|| build_dir.join(id)),
            command: task.command.clone(),
            inputs: task.inputs.iter().map(|p| absolute(&root, p)).collect(),
            outputs: task.outputs.iter().map(|p| absolute(&root, p)).collect(),
        })
        .collect();

    Ok(ProjectDescription {
        name: config.project.name.clone(),
        root,
        build_dir,
        units,
        tasks,
    })
}
