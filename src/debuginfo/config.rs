//! Emission configuration
//!
//! [`EmitConfig`] collects the knobs that change what the emitter writes without changing
//! how the code generator reports events: path normalization, the checksum algorithm for
//! physical sources, the size ceilings of legacy records, whether edit-and-continue data
//! is produced and which platform the method bodies target.

use crate::debuginfo::checksum::ChecksumAlgorithm;

/// Default ceiling, in UTF-16 code units, for string constants kept in the locals list.
pub const DEFAULT_MAX_CONSTANT_STRING_LEN: usize = 2031;

/// Default ceiling for the number of dynamic flags recorded per local.
pub const DEFAULT_MAX_DYNAMIC_FLAGS: usize = 64;

/// Language GUID for C# documents.
pub const LANGUAGE_CSHARP: uguid::Guid = uguid::guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1");

/// Vendor GUID for Microsoft languages.
pub const LANGUAGE_VENDOR_MICROSOFT: uguid::Guid =
    uguid::guid!("994b45c4-e6e9-11d2-903f-00c04fa302a1");

/// Document type GUID for text documents.
pub const DOCUMENT_TYPE_TEXT: uguid::Guid = uguid::guid!("5a869d0b-6611-11d3-bd2a-0000f80849bd");

/// Platform the method bodies are generated for.
///
/// WinRT code generation cannot consume dynamic call-site or edit-and-continue
/// custom records, so those are suppressed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPlatform {
    /// Regular desktop/core runtime
    #[default]
    Desktop,
    /// Windows Runtime (alternate code generation)
    WinRt,
}

/// Configuration for debug-information emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitConfig {
    /// Directory that relative document paths are resolved against.
    ///
    /// When `None`, paths are used verbatim (no `.`/`..` folding).
    pub base_directory: Option<String>,

    /// Algorithm used to hash physical source texts
    pub checksum_algorithm: ChecksumAlgorithm,

    /// String constants longer than this many UTF-16 units are silently dropped
    pub max_constant_string_len: usize,

    /// Dynamic flag lists longer than this are written empty; values above the
    /// 64-flag bucket capacity act as 64
    pub max_dynamic_flags: usize,

    /// Produce edit-and-continue slot maps and hoisted local scope records
    pub emit_enc_info: bool,

    /// Target platform of the generated code
    pub target: TargetPlatform,

    /// Language GUID written for every document
    pub language: uguid::Guid,

    /// Language vendor GUID written for every document
    pub language_vendor: uguid::Guid,

    /// Document type GUID written for every document
    pub document_type: uguid::Guid,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            base_directory: None,
            checksum_algorithm: ChecksumAlgorithm::Sha1,
            max_constant_string_len: DEFAULT_MAX_CONSTANT_STRING_LEN,
            max_dynamic_flags: DEFAULT_MAX_DYNAMIC_FLAGS,
            emit_enc_info: true,
            target: TargetPlatform::Desktop,
            language: LANGUAGE_CSHARP,
            language_vendor: LANGUAGE_VENDOR_MICROSOFT,
            document_type: DOCUMENT_TYPE_TEXT,
        }
    }
}

impl EmitConfig {
    /// Configuration for debug builds (the default)
    ///
    /// Emits edit-and-continue slot maps and hoisted scope records.
    #[must_use]
    pub fn debug() -> Self {
        Self::default()
    }

    /// Configuration for optimized builds
    ///
    /// Identical to [`EmitConfig::debug`] except that no edit-and-continue data is written.
    #[must_use]
    pub fn release() -> Self {
        Self {
            emit_enc_info: false,
            ..Self::default()
        }
    }

    /// Debug configuration for WinRT targets
    #[must_use]
    pub fn winrt() -> Self {
        Self {
            target: TargetPlatform::WinRt,
            ..Self::default()
        }
    }

    /// Set the directory relative document paths are resolved against
    #[must_use]
    pub fn with_base_directory(mut self, directory: impl Into<String>) -> Self {
        self.base_directory = Some(directory.into());
        self
    }

    /// Set the algorithm used to hash physical source texts
    #[must_use]
    pub fn with_checksum_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum_algorithm = algorithm;
        self
    }

    /// Returns `true` when dynamic-local and edit-and-continue records may be written.
    #[must_use]
    pub fn allows_enc_records(&self) -> bool {
        self.emit_enc_info && self.target != TargetPlatform::WinRt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_config_presets() {
        let debug = EmitConfig::debug();
        assert!(debug.emit_enc_info);
        assert_eq!(debug.target, TargetPlatform::Desktop);
        assert!(debug.allows_enc_records());
        assert_eq!(debug, EmitConfig::default());

        let release = EmitConfig::release();
        assert!(!release.emit_enc_info);
        assert!(!release.allows_enc_records());

        let winrt = EmitConfig::winrt();
        assert!(winrt.emit_enc_info);
        assert!(!winrt.allows_enc_records());
    }

    #[test]
    fn test_emit_config_builders() {
        let config = EmitConfig::default()
            .with_base_directory("/src")
            .with_checksum_algorithm(ChecksumAlgorithm::Md5);
        assert_eq!(config.base_directory.as_deref(), Some("/src"));
        assert_eq!(config.checksum_algorithm, ChecksumAlgorithm::Md5);
        assert_eq!(config.max_constant_string_len, DEFAULT_MAX_CONSTANT_STRING_LEN);
        assert_eq!(config.max_dynamic_flags, 64);
    }
}
