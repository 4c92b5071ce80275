//! The compilation-wide document table.
//!
//! Documents are keyed by normalized path. A [`DocumentId`] is an internal handle (the
//! registration index); the public 1-based file ids written to the output are assigned
//! by the emitter in first-referenced order, so they do not depend on which worker
//! thread happened to register a path first.
//!
//! Stored entries are never handed out mutably. [`DocumentTable::snapshot`] returns an
//! owned [`SourceDocument`] with the checksum looked up in the registry at that time.

use std::fmt;

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    debuginfo::checksum::{ChecksumRegistry, DocumentChecksum},
    Result,
};

/// Internal handle of a registered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u32);

impl DocumentId {
    /// Registration index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Immutable view of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Normalized path, the document's identity
    pub path: String,
    /// Checksum, when the file was hashed or declared by a pragma
    pub checksum: Option<DocumentChecksum>,
}

/// Concurrent, deduplicating document store.
#[derive(Debug, Default)]
pub struct DocumentTable {
    index: DashMap<String, DocumentId>,
    paths: boxcar::Vec<String>,
}

impl DocumentTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        DocumentTable {
            index: DashMap::new(),
            paths: boxcar::Vec::new(),
        }
    }

    /// Look up or register `normalized_path`.
    ///
    /// Registration happens under the map's shard lock, so two threads racing on the
    /// same path get the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the table outgrows 32-bit ids.
    pub fn get_or_create(&self, normalized_path: &str) -> Result<DocumentId> {
        if let Some(existing) = self.index.get(normalized_path) {
            return Ok(*existing);
        }

        match self.index.entry(normalized_path.to_string()) {
            Entry::Occupied(occupied) => Ok(*occupied.get()),
            Entry::Vacant(vacant) => {
                let index = self.paths.push(normalized_path.to_string());
                let id = DocumentId(crate::utils::to_u32(index)?);
                tracing::debug!(path = normalized_path, %id, "registered document");
                vacant.insert(id);
                Ok(id)
            }
        }
    }

    /// Id of an already registered path.
    #[must_use]
    pub fn find(&self, normalized_path: &str) -> Option<DocumentId> {
        self.index.get(normalized_path).map(|id| *id)
    }

    /// Normalized path of `id`.
    #[must_use]
    pub fn path(&self, id: DocumentId) -> Option<&str> {
        self.paths.get(id.index()).map(String::as_str)
    }

    /// Owned view of `id` with its current checksum.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` was not issued by this table.
    pub fn snapshot(&self, id: DocumentId, checksums: &ChecksumRegistry) -> Result<SourceDocument> {
        let path = self
            .path(id)
            .ok_or_else(|| malformed_error!("Unknown document handle {}", id))?;
        Ok(SourceDocument {
            path: path.to_string(),
            checksum: checksums.get(path),
        })
    }

    /// Number of registered documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.count()
    }

    /// Returns `true` if no document was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::checksum::{ChecksumAlgorithm, DocumentChecksum};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn dedup_by_path() {
        let table = DocumentTable::new();
        let a = table.get_or_create("/src/a.cs").unwrap();
        let b = table.get_or_create("/src/b.cs").unwrap();
        let a2 = table.get_or_create("/src/a.cs").unwrap();

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.path(b), Some("/src/b.cs"));
        assert_eq!(table.find("/src/c.cs"), None);
    }

    #[test]
    fn snapshot_reads_registry() {
        let table = DocumentTable::new();
        let checksums = ChecksumRegistry::new();
        let id = table.get_or_create("a.cs").unwrap();

        assert_eq!(table.snapshot(id, &checksums).unwrap().checksum, None);

        let checksum = DocumentChecksum::compute(ChecksumAlgorithm::Sha1, b"x");
        checksums.register("a.cs", checksum.clone());
        let snapshot = table.snapshot(id, &checksums).unwrap();
        assert_eq!(snapshot.path, "a.cs");
        assert_eq!(snapshot.checksum, Some(checksum));
    }

    #[test]
    fn concurrent_get_or_create() {
        let table = Arc::new(DocumentTable::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    let shared = table.get_or_create("shared.cs").unwrap();
                    table.get_or_create(&format!("own{i}.cs")).unwrap();
                    shared
                })
            })
            .collect();

        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(table.len(), 9);
    }
}
