//! Stable identities for files referenced by build targets.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// The identity of a file: its lexically normalized path.
///
/// Normalization never touches the filesystem, so files that do not exist yet
/// (generated sources, declared outputs) still get a stable identity. Two
/// spellings of the same path (`a/./b.vala`, `a/c/../b.vala`) compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(Arc<Path>);

impl FileId {
    /// Creates an identity for `path` after normalizing it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(Arc::from(normalize_path(path.as_ref())))
    }

    /// Resolves `path` against `base` if it is relative, then normalizes.
    pub fn resolve(base: &Path, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_absolute() {
            Self::new(path)
        } else {
            Self::new(base.join(path))
        }
    }

    /// Returns the normalized path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Returns the file name component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|n| n.to_str())
    }
}

/// Removes `.` components and folds `..` into its parent, lexically.
///
/// A `..` that would climb above the root is dropped; on a relative path it is
/// kept so that the result still points at the same place.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0.display())
    }
}

impl AsRef<Path> for FileId {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.path().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PathBuf::deserialize(deserializer).map(FileId::new)
    }
}
