//! Loading `valence.toml` project files.

use crate::error::ConfigError;
use crate::resolve::{resolve_project, ProjectDescription};
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project file in the project root.
pub const PROJECT_FILE: &str = "valence.toml";

/// Loads, validates and resolves `<root>/valence.toml`.
pub fn load_project(root: &Path) -> Result<ProjectDescription, ConfigError> {
    let content = std::fs::read_to_string(root.join(PROJECT_FILE))?;
    load_project_from_str(&content, root)
}

/// Parses, validates and resolves a project file held in memory.
pub fn load_project_from_str(content: &str, root: &Path) -> Result<ProjectDescription, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    resolve_project(&config, root)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.units.is_empty() && config.tasks.is_empty() {
        return Err(ConfigError::ValidationError(
            "project declares no units and no tasks".to_string(),
        ));
    }
    if let Some(id) = config.units.keys().find(|id| config.tasks.contains_key(*id)) {
        return Err(ConfigError::ValidationError(format!(
            "'{id}' is declared both as a unit and as a task"
        )));
    }
    if let Some((id, _)) = config.tasks.iter().find(|(_, t)| t.command.is_empty()) {
        return Err(ConfigError::MissingField(format!("tasks.{id}.command")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_project() {
        let toml = r#"
[project]
name = "demo"

[units.app]
args = ["--pkg=gio-2.0", "src/main.vala", "build/config.vala"]

[units.plugin]
args = ["--vapi=plugin.vapi", "plugin/plugin.vala"]

[tasks.config]
command = ["sh", "-c", "cp config.vala.in config.vala"]
inputs = ["config.vala.in"]
outputs = ["build/config.vala"]
"#;
        let desc = load_project_from_str(toml, Path::new("/p")).unwrap();
        assert_eq!(desc.name, "demo");
        assert_eq!(desc.units.len(), 2);
        assert_eq!(desc.tasks.len(), 1);
        assert_eq!(desc.units[0].id, "app");
        assert_eq!(desc.units[1].id, "plugin");
    }

    #[test]
    fn empty_name_errors() {
        let toml = r#"
[project]
name = ""

[units.app]
args = []
"#;
        let err = load_project_from_str(toml, Path::new("/p")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn no_targets_errors() {
        let err = load_project_from_str("[project]\nname = \"x\"\n", Path::new("/p")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn shared_id_errors() {
        let toml = r#"
[project]
name = "x"

[units.gen]
args = []

[tasks.gen]
command = "true"
"#;
        let err = load_project_from_str(toml, Path::new("/p")).unwrap_err();
        assert!(err.to_string().contains("both as a unit and as a task"));
    }

    #[test]
    fn task_without_command_errors() {
        let toml = r#"
[project]
name = "x"

[tasks.gen]
outputs = ["a.vala"]
"#;
        let err = load_project_from_str(toml, Path::new("/p")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "tasks.gen.command"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_project_from_str("not = [valid", Path::new("/p")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "[project]\nname = \"disk\"\n\n[units.app]\nargs = [\"main.vala\"]\n",
        )
        .unwrap();
        let desc = load_project(dir.path()).unwrap();
        assert_eq!(desc.name, "disk");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_project(Path::new("/nonexistent/project")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
