//! # symscope Prelude
//!
//! The types a code generator touches while producing debug information. Import this
//! module with a glob to get the session, the method builder and the event payloads in
//! one line.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all symscope operations
pub use crate::Error;

/// The result type used throughout symscope
pub use crate::Result;

/// Warnings collected during a compilation
pub use crate::{DiagnosticCategory, Diagnostics, SourceLocation};

// ================================================================================================
// Session and Configuration
// ================================================================================================

/// Compilation-wide state and its configuration
pub use crate::debuginfo::{
    config::{EmitConfig, TargetPlatform},
    session::DebugInfoSession,
};

/// Checksums of source documents
pub use crate::debuginfo::checksum::{ChecksumAlgorithm, ChecksumPragma, DocumentChecksum};

/// Source registration and span resolution
pub use crate::debuginfo::source::{LineDirective, RawSpan, SourceId, SourceText};

// ================================================================================================
// Method Building
// ================================================================================================

/// Per-method builder and its result
pub use crate::debuginfo::method::{
    MethodDebugInfo, MethodDebugInfoBuilder, MethodIdentity, MethodKind,
};

/// Event payloads passed to the builder
pub use crate::debuginfo::{
    constants::{ConstantRecord, ConstantValue, DecimalValue},
    dynamic::DynamicFlags,
    importscope::ImportRecord,
    locals::{LocalAttributes, LocalDeclaration, LocalSlotKind},
    sequencepoints::HiddenReason,
    token::Token,
};

// ================================================================================================
// Output
// ================================================================================================

/// The emitted document and the physical writer seam
pub use crate::emit::{BlobSymbolWriter, DebugInfoDocument, FileRecord, MethodRecord, SymbolWriter};

/// Legacy custom debug records found on emitted methods
pub use crate::debuginfo::customdebuginformation::CustomDebugInfo;
