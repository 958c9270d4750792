//! Interned symbol names for the per-unit symbol index.

use lasso::Rodeo;

/// An interned symbol name, valid only for the [`NameTable`] that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NameId(u32);

// SAFETY: `NameId` wraps a `u32`, which always fits in `usize` on supported
// platforms. `try_from_usize` rejects indices that don't fit in `u32`.
unsafe impl lasso::Key for NameId {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(NameId)
    }
}

/// A string table for symbol names.
///
/// Each compilation unit rebuilds its table from scratch after every
/// successful compile, so a single-threaded [`Rodeo`] is enough.
#[derive(Debug)]
pub struct NameTable {
    rodeo: Rodeo<NameId>,
}

impl NameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns `name`, returning the existing id if it was seen before.
    pub fn intern(&mut self, name: &str) -> NameId {
        self.rodeo.get_or_intern(name)
    }

    /// Looks up `name` without interning it.
    pub fn get(&self, name: &str) -> Option<NameId> {
        self.rodeo.get(name)
    }

    /// Resolves an id back to its text.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different table.
    pub fn resolve(&self, id: NameId) -> &str {
        self.rodeo.resolve(&id)
    }

    /// Number of distinct names in the table.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = NameTable::new();
        let a = table.intern("demo_app_run");
        let b = table.intern("demo_app_run");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve(a), "demo_app_run");
    }

    #[test]
    fn get_does_not_intern() {
        let mut table = NameTable::new();
        assert!(table.get("g_object_new").is_none());
        assert!(table.is_empty());
        let id = table.intern("g_object_new");
        assert_eq!(table.get("g_object_new"), Some(id));
    }
}
