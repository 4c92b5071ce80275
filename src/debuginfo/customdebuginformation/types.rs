//! Custom debug information record types.
//!
//! See the parent module [`crate::debuginfo::customdebuginformation`] for the blob layout.

use strum::{EnumCount, EnumIter};

use crate::debuginfo::{dynamic::DynamicFlags, locals::SlotInfo, token::Token};

/// Record format version written to every header.
pub const CDI_VERSION: u8 = 4;

/// Flag slots reserved per dynamic local bucket.
pub const DYNAMIC_FLAG_CAPACITY: usize = 64;

/// UTF-16 units reserved for a dynamic local's name.
pub const DYNAMIC_NAME_CAPACITY: usize = 64;

/// Kind byte of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum CustomDebugKind {
    /// Import counts per level
    UsingInfo = 0,
    /// Imports are those of another method
    ForwardInfo = 1,
    /// Imports are those of the module-level method
    ForwardToModuleInfo = 2,
    /// IL ranges of hoisted state machine locals
    StateMachineHoistedLocalScopes = 3,
    /// Name of the state machine type of a kickoff method
    ForwardIterator = 4,
    /// `dynamic` typed locals and constants
    DynamicLocals = 5,
    /// Edit-and-continue slot map
    EncLocalSlotMap = 6,
}

impl CustomDebugKind {
    /// Decode a kind byte.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        use strum::IntoEnumIterator;
        CustomDebugKind::iter().find(|kind| *kind as u8 == value)
    }
}

/// One bucket of the dynamic locals record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicLocalBucket {
    /// Flags, already capped
    pub flags: DynamicFlags,
    /// IL slot; 0 for constants
    pub slot: u32,
    /// Name; empty when it did not fit the fixed buffer
    pub name: String,
}

/// IL range of one hoisted local; `(0, 0)` when the local has no scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoistedScope {
    /// First IL offset
    pub start: u32,
    /// End IL offset
    pub end: u32,
}

impl HoistedScope {
    /// Returns `true` for the `(0, 0)` placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// A decoded or to-be-encoded custom debug record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomDebugInfo {
    /// Number of imports in each level, innermost first
    UsingInfo {
        /// Per-level counts
        counts: Vec<u16>,
    },
    /// Imports are those of method `token`
    ForwardInfo {
        /// Target method
        token: Token,
    },
    /// Imports are those of the module-level method `token`
    ForwardToModuleInfo {
        /// Target method
        token: Token,
    },
    /// Scopes of hoisted locals, by hoisted slot index
    StateMachineHoistedLocalScopes {
        /// One entry per hoisted slot
        scopes: Vec<HoistedScope>,
    },
    /// State machine type of a kickoff method
    ForwardIterator {
        /// Type name
        name: String,
    },
    /// `dynamic` typed locals and constants
    DynamicLocals {
        /// One bucket per variable
        buckets: Vec<DynamicLocalBucket>,
    },
    /// Edit-and-continue slot map
    EncLocalSlotMap {
        /// One entry per IL slot
        slots: Vec<SlotInfo>,
    },
    /// Record of a kind this crate does not interpret
    Unknown {
        /// Kind byte
        kind: u8,
        /// Raw payload
        data: Vec<u8>,
    },
}

impl CustomDebugInfo {
    /// Kind byte of this record.
    #[must_use]
    pub fn kind(&self) -> u8 {
        match self {
            CustomDebugInfo::UsingInfo { .. } => CustomDebugKind::UsingInfo as u8,
            CustomDebugInfo::ForwardInfo { .. } => CustomDebugKind::ForwardInfo as u8,
            CustomDebugInfo::ForwardToModuleInfo { .. } => {
                CustomDebugKind::ForwardToModuleInfo as u8
            }
            CustomDebugInfo::StateMachineHoistedLocalScopes { .. } => {
                CustomDebugKind::StateMachineHoistedLocalScopes as u8
            }
            CustomDebugInfo::ForwardIterator { .. } => CustomDebugKind::ForwardIterator as u8,
            CustomDebugInfo::DynamicLocals { .. } => CustomDebugKind::DynamicLocals as u8,
            CustomDebugInfo::EncLocalSlotMap { .. } => CustomDebugKind::EncLocalSlotMap as u8,
            CustomDebugInfo::Unknown { kind, .. } => *kind,
        }
    }
}
