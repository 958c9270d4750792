//! Differences between two sets of source files.

use std::collections::BTreeSet;
use valence_source::FileId;

/// How a set of source files changed between two compiles.
///
/// Every file lands in exactly one bucket. Buckets are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSetDiff {
    /// Files present now that were not present before.
    pub added: Vec<FileId>,
    /// Files present before that are gone now.
    pub removed: Vec<FileId>,
    /// Files present in both.
    pub retained: Vec<FileId>,
}

impl SourceSetDiff {
    /// Compares a previous set of files against the current one.
    pub fn between<'a>(
        previous: impl IntoIterator<Item = &'a FileId>,
        current: &BTreeSet<FileId>,
    ) -> Self {
        let previous: BTreeSet<&FileId> = previous.into_iter().collect();
        let mut diff = SourceSetDiff::default();
        for file in current {
            if previous.contains(file) {
                diff.retained.push(file.clone());
            } else {
                diff.added.push(file.clone());
            }
        }
        diff.removed = previous
            .into_iter()
            .filter(|f| !current.contains(*f))
            .cloned()
            .collect();
        diff
    }

    /// Returns `true` if nothing was added or removed.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<FileId> {
        names.iter().map(|n| FileId::new(format!("/p/{n}"))).collect()
    }

    #[test]
    fn buckets() {
        let before = set(&["a.vala", "b.vala", "c.vala"]);
        let after = set(&["b.vala", "c.vala", "d.vala"]);
        let diff = SourceSetDiff::between(&before, &after);
        assert_eq!(diff.added, vec![FileId::new("/p/d.vala")]);
        assert_eq!(diff.removed, vec![FileId::new("/p/a.vala")]);
        assert_eq!(diff.retained.len(), 2);
        assert!(!diff.is_unchanged());
    }

    #[test]
    fn identical_sets() {
        let files = set(&["a.vala", "b.vala"]);
        let diff = SourceSetDiff::between(&files, &files);
        assert!(diff.is_unchanged());
        assert_eq!(diff.retained.len(), 2);
    }

    #[test]
    fn from_empty() {
        let diff = SourceSetDiff::between(&BTreeSet::new(), &set(&["a.vala"]));
        assert_eq!(diff.added.len(), 1);
        assert!(diff.removed.is_empty());
    }
}
