//! Timestamp-validated analysis cache.

use crate::diff::SourceSetDiff;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use valence_common::Timestamp;
use valence_source::FileId;

/// A stored analysis result and when it was computed.
#[derive(Debug, Clone)]
pub struct CachedAnalysis<V> {
    /// The result. Never modified after construction.
    pub value: V,
    /// Logical time of computation.
    pub computed_at: Timestamp,
}

impl<V> CachedAnalysis<V> {
    /// Returns `true` if this result is at least as new as `valid_since`.
    /// `None` accepts everything.
    pub fn is_valid_since(&self, valid_since: Option<Timestamp>) -> bool {
        valid_since.map_or(true, |since| self.computed_at >= since)
    }
}

/// Per-file, per-kind cache of analysis results.
///
/// `K` is a closed set of analysis kinds, `V` the (cheaply clonable) result.
/// Results are replaced wholesale on recompute, never patched.
#[derive(Debug)]
pub struct AnalysisCache<K, V> {
    files: HashMap<FileId, HashMap<K, CachedAnalysis<V>>>,
}

impl<K, V> AnalysisCache<K, V>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Returns the cached result if it is still valid.
    pub fn get(&self, file: &FileId, kind: K, valid_since: Option<Timestamp>) -> Option<&V> {
        self.files
            .get(file)?
            .get(&kind)
            .filter(|entry| entry.is_valid_since(valid_since))
            .map(|entry| &entry.value)
    }

    /// Stores a freshly computed result, replacing any previous one.
    pub fn insert(&mut self, file: FileId, kind: K, value: V) -> &CachedAnalysis<V> {
        let slot = self.files.entry(file).or_default();
        slot.insert(
            kind,
            CachedAnalysis {
                value,
                computed_at: Timestamp::now(),
            },
        );
        &slot[&kind]
    }

    /// Returns the cached result if valid, otherwise computes, stores and
    /// returns a new one. A failed computation leaves the cache untouched.
    pub fn get_or_insert_with<E>(
        &mut self,
        file: &FileId,
        kind: K,
        valid_since: Option<Timestamp>,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(file, kind, valid_since) {
            return Ok(value.clone());
        }
        log::debug!("computing {kind:?} analysis for {file}");
        let value = compute()?;
        Ok(self.insert(file.clone(), kind, value).value.clone())
    }

    /// Drops every entry for files not in `live`, returning how the cached
    /// file set compares to `live`.
    pub fn retain_files(&mut self, live: &BTreeSet<FileId>) -> SourceSetDiff {
        let diff = SourceSetDiff::between(self.files.keys(), live);
        for file in &diff.removed {
            self.files.remove(file);
        }
        diff
    }

    /// Drops every entry for one file. Returns whether anything was cached.
    pub fn invalidate_file(&mut self, file: &FileId) -> bool {
        self.files.remove(file).is_some()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Files with at least one cached entry.
    pub fn known_files(&self) -> impl Iterator<Item = &FileId> {
        self.files.keys()
    }

    /// Total number of cached results.
    pub fn len(&self) -> usize {
        self.files.values().map(HashMap::len).sum()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for AnalysisCache<K, V>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
