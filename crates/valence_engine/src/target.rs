//! The common shape of everything the engine can build.

use crate::cancel::CancelToken;
use crate::error::BuildError;
use crate::unit::CompileReport;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use valence_common::{SharedStamp, Timestamp};
use valence_source::FileId;

/// A link to the target producing one of our inputs.
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Id of the producing target.
    pub target: String,
    /// The producer's `last_updated`, shared.
    pub stamp: SharedStamp,
}

impl Dependency {
    /// When the producer last built successfully.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.stamp.get()
    }
}

/// State shared by every build target.
#[derive(Debug)]
pub struct TargetInfo {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Base directory for outputs.
    pub output_dir: PathBuf,
    /// Files read.
    pub inputs: BTreeSet<FileId>,
    /// Files written.
    pub outputs: BTreeSet<FileId>,
    /// Inputs produced by other targets.
    pub dependencies: BTreeMap<FileId, Dependency>,
    last_updated: SharedStamp,
}

impl TargetInfo {
    /// Creates a target that has never been built.
    pub fn new(id: impl Into<String>, name: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            output_dir: output_dir.into(),
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            dependencies: BTreeMap::new(),
            last_updated: SharedStamp::never(),
        }
    }

    /// When this target last built successfully.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.last_updated.get()
    }

    /// A handle dependents keep to observe [`last_updated`](Self::last_updated).
    pub fn stamp(&self) -> &SharedStamp {
        &self.last_updated
    }

    /// Records a successful build now.
    pub(crate) fn mark_built(&self) -> Timestamp {
        let now = Timestamp::now();
        self.last_updated.set(now);
        now
    }

    /// Forgets the last successful build.
    pub(crate) fn clear_built(&self) {
        self.last_updated.clear();
    }

    /// Records that `file` is produced by `target`.
    pub fn add_dependency(&mut self, file: FileId, target: impl Into<String>, stamp: SharedStamp) {
        self.dependencies.insert(
            file,
            Dependency {
                target: target.into(),
                stamp,
            },
        );
    }

    /// Drops every dependency on `target`. Returns how many were removed.
    pub fn remove_dependencies_on(&mut self, target: &str) -> usize {
        let before = self.dependencies.len();
        self.dependencies.retain(|_, dep| dep.target != target);
        before - self.dependencies.len()
    }

    /// The first dependency that built after we did, if any.
    pub fn newer_dependency(&self) -> Option<&Dependency> {
        let ours = self.last_updated();
        self.dependencies
            .values()
            .find(|dep| dep.last_updated().is_some_and(|t| t.is_newer_than(ours)))
    }
}

/// The outcome of a successful [`BuildTarget::build_if_stale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Nothing was stale.
    UpToDate,
    /// A compilation unit recompiled.
    Rebuilt(CompileReport),
    /// A build task ran its command.
    Ran,
}

impl BuildStatus {
    /// Returns `true` if any work was done.
    pub fn did_work(&self) -> bool {
        !matches!(self, BuildStatus::UpToDate)
    }
}

/// Something that can be brought up to date.
pub trait BuildTarget: Send {
    /// Shared target state.
    fn info(&self) -> &TargetInfo;

    /// Shared target state, mutably.
    fn info_mut(&mut self) -> &mut TargetInfo;

    /// Rebuilds if stale relative to inputs and dependencies.
    ///
    /// On error the previous successful state is kept.
    fn build_if_stale(&mut self, cancel: &CancelToken) -> Result<BuildStatus, BuildError>;

    /// Stable identifier.
    fn id(&self) -> &str {
        &self.info().id
    }

    /// When this target last built successfully.
    fn last_updated(&self) -> Option<Timestamp> {
        self.info().last_updated()
    }
}
