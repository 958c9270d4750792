//! Project descriptions from meson target introspection.
//!
//! Reads the JSON printed by `meson introspect --targets` (also found at
//! `<builddir>/meson-info/intro-targets.json`). Targets with Vala sources
//! become compilation units, custom targets become build tasks, everything
//! else is skipped.

use crate::error::ConfigError;
use crate::resolve::{ProjectDescription, TaskDescription, UnitDescription};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use valence_source::normalize_path;

/// Location of the introspection file inside a meson build directory.
pub const INTRO_TARGETS: &str = "meson-info/intro-targets.json";

#[derive(Debug, Deserialize)]
struct MesonTarget {
    name: String,
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    filename: Vec<PathBuf>,
    #[serde(default)]
    target_sources: Vec<MesonTargetSource>,
}

#[derive(Debug, Deserialize)]
struct MesonTargetSource {
    language: String,
    #[serde(default)]
    compiler: Vec<String>,
    #[serde(default)]
    parameters: Vec<String>,
    #[serde(default)]
    sources: Vec<PathBuf>,
    #[serde(default)]
    generated_sources: Vec<PathBuf>,
}

/// Loads `<build_dir>/meson-info/intro-targets.json`.
pub fn load_meson_targets(root: &Path, build_dir: &Path) -> Result<ProjectDescription, ConfigError> {
    let content = std::fs::read_to_string(build_dir.join(INTRO_TARGETS))?;
    load_meson_targets_from_str(&content, root, build_dir)
}

/// Builds a project description from introspection JSON.
///
/// Relative paths inside target parameters resolve against the build
/// directory, which is where meson runs the compiler.
pub fn load_meson_targets_from_str(
    json: &str,
    root: &Path,
    build_dir: &Path,
) -> Result<ProjectDescription, ConfigError> {
    let targets: Vec<MesonTarget> =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    let root = normalize_path(root);
    let build_dir = normalize_path(build_dir);

    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("meson-project")
        .to_string();
    let mut units = Vec::new();
    let mut tasks = Vec::new();

    for target in targets {
        let output_dir = target
            .filename
            .first()
            .and_then(|f| build_dir.join(f).parent().map(normalize_path))
            .unwrap_or_else(|| build_dir.clone());

        if let Some(vala) = target.target_sources.iter().find(|s| s.language == "vala") {
            let mut arguments = vala.parameters.clone();
            arguments.extend(
                vala.sources
                    .iter()
                    .chain(&vala.generated_sources)
                    .map(|p| p.to_string_lossy().into_owned()),
            );
            units.push(UnitDescription {
                id: target.id,
                name: target.name,
                source_dir: build_dir.clone(),
                output_dir,
                arguments,
                generated: vala
                    .generated_sources
                    .iter()
                    .map(|p| normalize_path(&build_dir.join(p)))
                    .collect(),
            });
        } else if target.kind == "custom" {
            let Some(source) = target.target_sources.first() else {
                log::debug!("custom target `{}` has no command; skipping", target.id);
                continue;
            };
            if source.compiler.is_empty() {
                log::debug!("custom target `{}` has no command; skipping", target.id);
                continue;
            }
            tasks.push(TaskDescription {
                id: target.id,
                name: target.name,
                output_dir: output_dir.clone(),
                command: source.compiler.clone(),
                inputs: source
                    .sources
                    .iter()
                    .map(|p| normalize_path(&build_dir.join(p)))
                    .collect(),
                outputs: target
                    .filename
                    .iter()
                    .map(|p| normalize_path(&build_dir.join(p)))
                    .collect(),
            });
        } else {
            log::debug!(
                "skipping {} target `{}` without Vala sources",
                target.kind,
                target.id
            );
        }
    }

    units.sort_by(|a, b| a.id.cmp(&b.id));
    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(ProjectDescription {
        name,
        root,
        build_dir,
        units,
        tasks,
    })
}
