//! Line/column positions inside a source file.

use crate::file_id::FileId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-indexed line/column position in a file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// The file.
    pub file: FileId,
    /// Line number, starting at 1.
    pub line: u32,
    /// Column number, starting at 1.
    pub column: u32,
}

impl Location {
    /// Creates a location.
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let loc = Location::new(FileId::new("/p/src/main.vala"), 12, 5);
        assert_eq!(loc.to_string(), "/p/src/main.vala:12:5");
    }

    #[test]
    fn orders_by_file_then_position() {
        let f = FileId::new("/p/a.vala");
        let a = Location::new(f.clone(), 3, 9);
        let b = Location::new(f.clone(), 4, 1);
        let c = Location::new(FileId::new("/p/b.vala"), 1, 1);
        assert!(a < b);
        assert!(b < c);
    }
}
