//! Document checksums and the compilation-wide checksum registry.
//!
//! Every physical source text gets a checksum computed over its exact UTF-8 bytes.
//! `#pragma checksum` directives can additionally declare the checksum of files that
//! only appear through `#line` mappings (generated code, for example).
//!
//! # Registration rules
//!
//! - The registry is keyed by the normalized path; among pragmas the first
//!   registration wins.
//! - A checksum computed from a physical source always wins over a pragma, whichever
//!   was registered first.
//! - A registration for the same path with a different algorithm or different bytes
//!   is a conflict. The compiler gets one warning at the losing pragma.
//! - Checksum bytes are compared by value, so pragmas differing only in hex digit case
//!   are identical.
//! - Malformed pragmas (bad GUID, odd number of hex digits, non-hex characters, empty
//!   hash) are reported and otherwise ignored.
//!
//! # Thread Safety
//!
//! [`ChecksumRegistry`] is backed by a `DashMap`; every registration runs under the
//! entry lock of its path, so concurrent builders observe one consistent value per
//! path.
//!
//! # Examples
//!
//! ```rust
//! use symscope::debuginfo::checksum::{ChecksumAlgorithm, ChecksumRegistry, DocumentChecksum, Registration};
//!
//! let registry = ChecksumRegistry::new();
//! let first = DocumentChecksum::compute(ChecksumAlgorithm::Sha1, b"class C {}");
//! let second = DocumentChecksum::compute(ChecksumAlgorithm::Sha1, b"class D {}");
//!
//! assert_eq!(registry.register("/src/a.cs", first.clone()), Registration::Inserted);
//! assert_eq!(registry.register("/src/a.cs", second), Registration::Conflict);
//! assert_eq!(registry.get("/src/a.cs"), Some(first));
//! ```

use dashmap::{mapref::entry::Entry, DashMap};
use md5::Md5;
use sha1::{Digest, Sha1};
use uguid::Guid;

use crate::{
    debuginfo::{
        diagnostics::{DiagnosticCategory, Diagnostics, SourceLocation},
        source::PathNormalizer,
    },
    utils::parse_hex_bytes,
};

/// Algorithm id of SHA-1 checksums.
pub const CHECKSUM_SHA1: Guid = uguid::guid!("ff1816ec-aa5e-4d10-87f7-6f4963833460");

/// Algorithm id of MD5 checksums.
pub const CHECKSUM_MD5: Guid = uguid::guid!("406ea660-64cf-4c82-b6f0-42d48172a799");

/// Algorithm id of SHA-256 checksums (accepted from pragmas only).
pub const CHECKSUM_SHA256: Guid = uguid::guid!("8829d00f-11b8-4213-878b-770e8597ac16");

/// Algorithms the emitter can compute itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumAlgorithm {
    /// SHA-1 (20 bytes)
    #[default]
    Sha1,
    /// MD5 (16 bytes)
    Md5,
}

impl ChecksumAlgorithm {
    /// Algorithm id written to the document record.
    #[must_use]
    pub fn guid(self) -> Guid {
        match self {
            ChecksumAlgorithm::Sha1 => CHECKSUM_SHA1,
            ChecksumAlgorithm::Md5 => CHECKSUM_MD5,
        }
    }

    /// Map an algorithm id back to a computable algorithm.
    #[must_use]
    pub fn from_guid(guid: Guid) -> Option<Self> {
        if guid == CHECKSUM_SHA1 {
            Some(ChecksumAlgorithm::Sha1)
        } else if guid == CHECKSUM_MD5 {
            Some(ChecksumAlgorithm::Md5)
        } else {
            None
        }
    }

    /// Hash `data`.
    #[must_use]
    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        match self {
            ChecksumAlgorithm::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(data);
                hasher.finalize().to_vec()
            }
            ChecksumAlgorithm::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(data);
                hasher.finalize().to_vec()
            }
        }
    }
}

/// Checksum of one document: algorithm id plus hash bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentChecksum {
    /// Algorithm id
    pub algorithm: Guid,
    /// Hash value
    pub bytes: Vec<u8>,
}

impl DocumentChecksum {
    /// Hash `data` with `algorithm`.
    #[must_use]
    pub fn compute(algorithm: ChecksumAlgorithm, data: &[u8]) -> Self {
        DocumentChecksum {
            algorithm: algorithm.guid(),
            bytes: algorithm.compute(data),
        }
    }
}

/// A `#pragma checksum "path" "{guid}" "bytes"` directive, as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumPragma {
    /// 1-based physical line of the pragma
    pub line: u32,
    /// File the checksum is declared for
    pub path: String,
    /// Algorithm GUID text, with or without braces
    pub guid_text: String,
    /// Hash as hex digits
    pub bytes_text: String,
}

impl ChecksumPragma {
    /// Create a pragma record.
    pub fn new(
        line: u32,
        path: impl Into<String>,
        guid_text: impl Into<String>,
        bytes_text: impl Into<String>,
    ) -> Self {
        ChecksumPragma {
            line,
            path: path.into(),
            guid_text: guid_text.into(),
            bytes_text: bytes_text.into(),
        }
    }

    /// Decode the GUID and hash text.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the pragma is malformed.
    pub fn parse(&self) -> std::result::Result<DocumentChecksum, &'static str> {
        let guid_text = self.guid_text.trim();
        let guid_text = guid_text
            .strip_prefix('{')
            .and_then(|text| text.strip_suffix('}'))
            .unwrap_or(guid_text);
        let algorithm = Guid::try_parse(guid_text).map_err(|_| "Invalid GUID")?;

        if self.bytes_text.is_empty() {
            return Err("Empty hash value");
        }
        if self.bytes_text.len() % 2 != 0 {
            return Err("Hash value must have an even number of hex digits");
        }
        let bytes = parse_hex_bytes(&self.bytes_text).ok_or("Invalid hex digit in hash value")?;

        Ok(DocumentChecksum { algorithm, bytes })
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First registration for the path
    Inserted,
    /// Same value as the stored one
    Duplicate,
    /// Different value; the stored one was kept
    Conflict,
}

/// Where a stored checksum came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    /// Hash of a physical source text
    Computed,
    /// `#pragma checksum` at this location
    Pragma(SourceLocation),
    /// Direct registration without a location
    Declared,
}

#[derive(Debug, Clone)]
struct StoredChecksum {
    checksum: DocumentChecksum,
    origin: Origin,
}

/// Compilation-wide map of normalized path to checksum.
#[derive(Debug, Default)]
pub struct ChecksumRegistry {
    entries: DashMap<String, StoredChecksum>,
}

impl ChecksumRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        ChecksumRegistry {
            entries: DashMap::new(),
        }
    }

    /// Register `checksum` for `normalized_path`; the first writer wins.
    pub fn register(&self, normalized_path: &str, checksum: DocumentChecksum) -> Registration {
        self.insert_declared(normalized_path, checksum, Origin::Declared)
    }

    /// Register the hash of the physical source at `normalized_path`.
    ///
    /// A pragma stored earlier for the path is replaced. If its value differed, the
    /// conflict is reported at the pragma's location, the same warning the pragma
    /// would have received had the source come first.
    pub fn register_computed(
        &self,
        normalized_path: &str,
        checksum: DocumentChecksum,
        diagnostics: &Diagnostics,
    ) -> Registration {
        match self.entries.entry(normalized_path.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(StoredChecksum {
                    checksum,
                    origin: Origin::Computed,
                });
                Registration::Inserted
            }
            Entry::Occupied(mut occupied) => {
                let stored = occupied.get_mut();
                if stored.origin == Origin::Computed {
                    return if stored.checksum == checksum {
                        Registration::Duplicate
                    } else {
                        tracing::debug!(path = %normalized_path, "two sources share a normalized path");
                        Registration::Conflict
                    };
                }

                let same = stored.checksum == checksum;
                let replaced = std::mem::replace(
                    stored,
                    StoredChecksum {
                        checksum,
                        origin: Origin::Computed,
                    },
                );
                if same {
                    return Registration::Duplicate;
                }
                if let Origin::Pragma(location) = replaced.origin {
                    tracing::debug!(path = %normalized_path, "source hash overrides an earlier checksum pragma");
                    diagnostics.warning_at(
                        DiagnosticCategory::Checksum,
                        conflict_message(normalized_path),
                        location,
                    );
                }
                Registration::Conflict
            }
        }
    }

    fn insert_declared(&self, normalized_path: &str, checksum: DocumentChecksum, origin: Origin) -> Registration {
        match self.entries.entry(normalized_path.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(StoredChecksum { checksum, origin });
                Registration::Inserted
            }
            Entry::Occupied(occupied) => {
                if occupied.get().checksum == checksum {
                    Registration::Duplicate
                } else {
                    Registration::Conflict
                }
            }
        }
    }

    /// Validate and register a pragma found in `source_path`.
    ///
    /// Malformed pragmas and conflicts are reported to `diagnostics`.
    pub fn register_pragma(
        &self,
        normalizer: &PathNormalizer,
        source_path: &str,
        pragma: &ChecksumPragma,
        diagnostics: &Diagnostics,
    ) -> Option<Registration> {
        let location = SourceLocation::new(source_path, pragma.line);

        let checksum = match pragma.parse() {
            Ok(checksum) => checksum,
            Err(problem) => {
                tracing::debug!(path = %pragma.path, problem, "ignoring malformed checksum pragma");
                diagnostics.warning_at(DiagnosticCategory::Pragma, problem, location);
                return None;
            }
        };

        let normalized = normalizer.normalize(&pragma.path);
        let registration = self.insert_declared(&normalized, checksum, Origin::Pragma(location.clone()));
        if registration == Registration::Conflict {
            tracing::debug!(path = %normalized, "conflicting checksum pragma");
            diagnostics.warning_at(DiagnosticCategory::Checksum, conflict_message(&normalized), location);
        }
        Some(registration)
    }

    /// Stored checksum for `normalized_path`.
    #[must_use]
    pub fn get(&self, normalized_path: &str) -> Option<DocumentChecksum> {
        self.entries
            .get(normalized_path)
            .map(|entry| entry.checksum.clone())
    }

    /// Number of registered paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn conflict_message(path: &str) -> String {
    format!("Conflicting checksum for file '{path}'")
}
