//! Build tasks: external commands that produce files for compilation units.

use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::target::{BuildStatus, BuildTarget, TargetInfo};
use std::process::Command;
use std::time::SystemTime;
use valence_common::InternalError;
use valence_config::TaskDescription;
use valence_source::FileId;

/// Runs a command to turn its inputs into its outputs.
///
/// Tasks never touch a frontend context, so they run outside the build
/// context scope.
#[derive(Debug)]
pub struct BuildTask {
    info: TargetInfo,
    command: Vec<String>,
    last_run: Option<SystemTime>,
}

impl BuildTask {
    /// Creates a task from its description.
    pub fn new(desc: &TaskDescription) -> Self {
        let mut info = TargetInfo::new(&desc.id, &desc.name, &desc.output_dir);
        info.inputs = desc.inputs.iter().map(FileId::new).collect();
        info.outputs = desc.outputs.iter().map(FileId::new).collect();
        Self {
            info,
            command: desc.command.clone(),
            last_run: None,
        }
    }

    /// Program and arguments.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Why the task should run, or `None` if it is up to date.
    fn staleness(&self) -> Option<String> {
        let (Some(_), Some(last_run)) = (self.info.last_updated(), self.last_run) else {
            return Some("never run".to_string());
        };
        if let Some(dep) = self.info.newer_dependency() {
            return Some(format!("dependency '{}' rebuilt", dep.target));
        }
        for output in &self.info.outputs {
            if !output.path().exists() {
                return Some(format!("{output} is missing"));
            }
        }
        for input in &self.info.inputs {
            match std::fs::metadata(input.path()).and_then(|m| m.modified()) {
                Ok(modified) if modified > last_run => return Some(format!("{input} changed")),
                Ok(_) => {}
                Err(e) => return Some(format!("cannot stat {input}: {e}")),
            }
        }
        None
    }

    fn run(&mut self, cancel: &CancelToken) -> Result<(), BuildError> {
        cancel.check()?;
        let (program, args) = self.command.split_first().ok_or_else(|| {
            InternalError::new(format!("task '{}' has an empty command", self.info.id))
        })?;
        std::fs::create_dir_all(&self.info.output_dir)
            .map_err(|e| BuildError::io(&self.info.output_dir, e))?;

        log::info!("running task '{}': {}", self.info.id, self.command.join(" "));
        let started = SystemTime::now();
        let output = Command::new(program)
            .args(args)
            .current_dir(&self.info.output_dir)
            .output()
            .map_err(|e| BuildError::io(program, e))?;
        if !output.status.success() {
            return Err(BuildError::TaskFailed {
                target: self.info.id.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        self.last_run = Some(started);
        self.info.mark_built();
        Ok(())
    }
}

impl BuildTarget for BuildTask {
    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut TargetInfo {
        &mut self.info
    }

    fn build_if_stale(&mut self, cancel: &CancelToken) -> Result<BuildStatus, BuildError> {
        cancel.check()?;
        let Some(reason) = self.staleness() else {
            return Ok(BuildStatus::UpToDate);
        };
        log::debug!("task '{}' is stale: {reason}", self.info.id);
        self.run(cancel)?;
        Ok(BuildStatus::Ran)
    }
}
