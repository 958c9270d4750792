//! Reverse lookup from generated C names to declarations.

use crate::frontend::Context;
use std::collections::HashMap;
use valence_common::{NameId, NameTable};
use valence_source::{FileId, Location};

/// Maps C symbol names to the location of the declaration that produced them.
///
/// Rebuilt from scratch after every successful compile.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    names: NameTable,
    locations: HashMap<NameId, Location>,
}

impl SymbolIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every symbol with a C name in the context's files. When two
    /// declarations share a C name the first one wins.
    pub fn build(context: &dyn Context) -> Self {
        let mut index = Self::new();
        for file in context.source_files() {
            for symbol in context.symbols(&file) {
                if let Some(c_name) = &symbol.c_name {
                    index.insert(c_name, Location::new(file.clone(), symbol.line, symbol.column));
                }
            }
        }
        log::debug!("indexed {} C names", index.len());
        index
    }

    /// Adds one entry unless the name is already present.
    pub fn insert(&mut self, c_name: &str, location: Location) {
        let id = self.names.intern(c_name);
        self.locations.entry(id).or_insert(location);
    }

    /// Finds the declaration for a C name.
    pub fn lookup(&self, c_name: &str) -> Option<&Location> {
        self.locations.get(&self.names.get(c_name)?)
    }

    /// Removes every entry declared in `file`.
    pub fn remove_file(&mut self, file: &FileId) {
        self.locations.retain(|_, loc| &loc.file != file);
    }

    /// Number of indexed names.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_declaration_wins() {
        let a = FileId::new("/p/a.vala");
        let b = FileId::new("/p/b.vala");
        let mut index = SymbolIndex::new();
        index.insert("demo_app_run", Location::new(a.clone(), 3, 5));
        index.insert("demo_app_run", Location::new(b, 9, 1));
        assert_eq!(index.lookup("demo_app_run"), Some(&Location::new(a, 3, 5)));
        assert_eq!(index.len(), 1);
        assert!(index.lookup("demo_app_stop").is_none());
    }

    #[test]
    fn remove_file() {
        let a = FileId::new("/p/a.vala");
        let mut index = SymbolIndex::new();
        index.insert("demo_main", Location::new(a.clone(), 1, 1));
        index.remove_file(&a);
        assert!(index.is_empty());
        assert!(index.lookup("demo_main").is_none());
    }
}
