//! Source documents owned by compilation units.

use crate::file_id::FileId;
use crate::kind::SourceKind;
use std::io;
use std::sync::Arc;
use valence_common::{ContentHash, Timestamp};

/// A source file as seen by one compilation unit.
///
/// Holds the live text (which may be edited between builds), a freshness
/// stamp bumped on every edit, and a snapshot of the text as of the last
/// successful compile. Consumers that need positions matching the compiled
/// artifact read [`last_compiled_content`](Self::last_compiled_content)
/// rather than the live text.
#[derive(Debug)]
pub struct SourceDocument {
    file: FileId,
    kind: SourceKind,
    content: String,
    content_hash: ContentHash,
    last_updated: Timestamp,
    last_compiled_content: Option<Arc<str>>,
    /// Namespaces imported into this file implicitly. Rebuilt on every
    /// configure.
    default_imports: Vec<String>,
}

impl SourceDocument {
    /// Creates a document from in-memory text.
    pub fn new(file: FileId, kind: SourceKind, content: String) -> Self {
        let content_hash = ContentHash::of_text(&content);
        Self {
            file,
            kind,
            content,
            content_hash,
            last_updated: Timestamp::now(),
            last_compiled_content: None,
            default_imports: Vec::new(),
        }
    }

    /// Reads a document from disk. The kind is taken from the extension.
    pub fn load(file: FileId) -> io::Result<Self> {
        let kind = SourceKind::from_path(file.path()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{file} is not a recognized source file"),
            )
        })?;
        let content = std::fs::read_to_string(file.path())?;
        Ok(Self::new(file, kind, content))
    }

    /// The file identity.
    pub fn file(&self) -> &FileId {
        &self.file
    }

    /// The source kind.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The live text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Hash of the live text.
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// When the live text last changed.
    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// The text as of the last successful compile, if any.
    pub fn last_compiled_content(&self) -> Option<&Arc<str>> {
        self.last_compiled_content.as_ref()
    }

    /// Replaces the live text. Always bumps the freshness stamp, even when the
    /// new text is identical: an edit is an edit.
    pub fn update(&mut self, content: String) {
        self.content_hash = ContentHash::of_text(&content);
        self.content = content;
        self.last_updated = Timestamp::now();
    }

    /// Re-reads the file from disk. The stamp is bumped only if the bytes
    /// changed. Returns whether they did.
    pub fn reload(&mut self) -> io::Result<bool> {
        let content = std::fs::read_to_string(self.file.path())?;
        if ContentHash::of_text(&content) == self.content_hash {
            return Ok(false);
        }
        self.update(content);
        Ok(true)
    }

    /// Records the live text as the compiled-against snapshot and returns it.
    pub fn snapshot(&mut self) -> Arc<str> {
        let reuse = self
            .last_compiled_content
            .as_ref()
            .filter(|old| ContentHash::of_text(old) == self.content_hash)
            .cloned();
        let snapshot = reuse.unwrap_or_else(|| Arc::from(self.content.as_str()));
        self.last_compiled_content = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Implicit namespace imports for this file.
    pub fn default_imports(&self) -> &[String] {
        &self.default_imports
    }

    /// Adds an implicit namespace import. Duplicates are ignored.
    pub fn add_default_import(&mut self, namespace: &str) {
        if !self.default_imports.iter().any(|ns| ns == namespace) {
            self.default_imports.push(namespace.to_string());
        }
    }

    /// Drops all transient per-file annotations so the next configure starts
    /// from a clean slate.
    pub fn clear_annotations(&mut self) {
        self.default_imports.clear();
    }
}
