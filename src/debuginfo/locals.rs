//! Local variables and IL slot allocation.
//!
//! Slots are handed out by a monotonically increasing counter in declaration order;
//! a slot is never reused for another named local, even when the live ranges of two
//! sibling scopes do not overlap. Only temporaries go back to a free list and are
//! reused, and they never appear in the locals list.
//!
//! Every slot has an entry in the edit-and-continue slot map: temporaries as `temp`,
//! everything else as `(kind, syntax offset, ordinal)`, which is what lets a later
//! compilation match the slot again.

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

use crate::{debuginfo::dynamic::DynamicFlags, Result};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Attributes of a local as written to the symbol file
    pub struct LocalAttributes : u32 {
        /// Compiler generated, hidden from the debugger's locals window
        const DEBUGGER_HIDDEN = 0x0001;
    }
}

/// Classification of a local slot.
///
/// The kind decides how a slot is matched across edits: temporaries never are,
/// all other kinds are matched by `(kind, syntax offset, ordinal)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum LocalSlotKind {
    /// Short lived compiler temporary
    Temp,
    /// Local declared by the user
    UserDefined,
    /// `lock` statement: the "lock taken" flag
    LockTaken,
    /// `lock` statement: the locked object
    Lock,
    /// `using` statement resource
    Using,
    /// `foreach` enumerator
    ForEachEnumerator,
    /// `foreach` over an array: the array
    ForEachArray,
    /// `foreach` over an array: the index
    ForEachArrayIndex,
    /// `foreach` over an array: the upper bound
    ForEachArrayLimit,
    /// `fixed` statement pinned reference
    FixedReference,
    /// `fixed` statement pinned string
    FixedString,
    /// Closure display class instance
    LambdaDisplayClass,
    /// Exception object kept across an `await` in a catch block
    TryAwaitPendingException,
    /// Hoisted into a state machine field; has no IL slot
    StateMachineHoisted,
}

impl LocalSlotKind {
    /// Numeric kind written to the slot map, `None` for temporaries and hoisted locals.
    #[must_use]
    pub fn code(self) -> Option<u8> {
        match self {
            LocalSlotKind::Temp | LocalSlotKind::StateMachineHoisted => None,
            LocalSlotKind::UserDefined => Some(0),
            LocalSlotKind::LockTaken => Some(1),
            LocalSlotKind::Lock => Some(2),
            LocalSlotKind::Using => Some(3),
            LocalSlotKind::ForEachEnumerator => Some(4),
            LocalSlotKind::ForEachArray => Some(5),
            LocalSlotKind::ForEachArrayIndex => Some(6),
            LocalSlotKind::ForEachArrayLimit => Some(7),
            LocalSlotKind::FixedReference => Some(8),
            LocalSlotKind::FixedString => Some(9),
            LocalSlotKind::LambdaDisplayClass => Some(10),
            LocalSlotKind::TryAwaitPendingException => Some(11),
        }
    }

    /// Inverse of [`LocalSlotKind::code`].
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        use strum::IntoEnumIterator;
        LocalSlotKind::iter().find(|kind| kind.code() == Some(code))
    }

    /// Attributes a local of this kind gets unless the caller overrides them.
    #[must_use]
    pub fn default_attributes(self) -> LocalAttributes {
        match self {
            LocalSlotKind::UserDefined | LocalSlotKind::LambdaDisplayClass => {
                LocalAttributes::empty()
            }
            _ => LocalAttributes::DEBUGGER_HIDDEN,
        }
    }

    /// Returns `true` for kinds declared as named locals.
    #[must_use]
    pub fn is_declarable(self) -> bool {
        self.code().is_some()
    }

    /// Returns `true` for kinds that occupy an IL slot.
    #[must_use]
    pub fn has_slot(self) -> bool {
        self != LocalSlotKind::StateMachineHoisted
    }
}

/// A local variable as declared by the code generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeclaration {
    /// Debugger-visible name
    pub name: String,
    /// Slot kind
    pub kind: LocalSlotKind,
    /// Offset of the declaring syntax node relative to the method body start
    pub syntax_offset: i32,
    /// Distinguishes several slots of the same kind at the same syntax offset
    pub ordinal: u32,
    /// Attribute override
    pub attributes: Option<LocalAttributes>,
    /// Dynamic flags of the local's type
    pub dynamic_flags: Option<DynamicFlags>,
    /// Explicit live range; defaults to the scope range
    pub live_range: Option<(u32, u32)>,
}

impl LocalDeclaration {
    /// A local of `kind` declared at `syntax_offset`.
    pub fn new(name: impl Into<String>, kind: LocalSlotKind, syntax_offset: i32) -> Self {
        LocalDeclaration {
            name: name.into(),
            kind,
            syntax_offset,
            ordinal: 0,
            attributes: None,
            dynamic_flags: None,
            live_range: None,
        }
    }

    /// A user-declared local.
    pub fn user(name: impl Into<String>, syntax_offset: i32) -> Self {
        Self::new(name, LocalSlotKind::UserDefined, syntax_offset)
    }

    /// Set the ordinal.
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Override the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: LocalAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Attach dynamic flags.
    #[must_use]
    pub fn with_dynamic_flags(mut self, flags: DynamicFlags) -> Self {
        self.dynamic_flags = Some(flags);
        self
    }

    /// Set an explicit live range `[start, end)`.
    #[must_use]
    pub fn with_live_range(mut self, start: u32, end: u32) -> Self {
        self.live_range = Some((start, end));
        self
    }
}

/// A local with its slot, as recorded in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRecord {
    /// Debugger-visible name
    pub name: String,
    /// IL slot
    pub slot: u32,
    /// Start of the live range
    pub live_start: u32,
    /// End of the live range (exclusive)
    pub live_end: u32,
    /// Attributes
    pub attributes: LocalAttributes,
    /// Slot kind
    pub kind: LocalSlotKind,
    /// Dynamic flags of the local's type
    pub dynamic_flags: Option<DynamicFlags>,
}

/// One entry of the edit-and-continue slot map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotInfo {
    /// Reusable temporary
    Temp,
    /// Named slot
    Named {
        /// Slot kind
        kind: LocalSlotKind,
        /// Declaring syntax offset
        syntax_offset: i32,
        /// Ordinal among slots of the same kind and offset
        ordinal: u32,
    },
}

/// Per-method slot counter.
#[derive(Debug, Clone, Default)]
pub struct SlotAllocator {
    slots: Vec<SlotInfo>,
    free_temps: Vec<u32>,
}

impl SlotAllocator {
    /// Create an allocator with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh slot for a named local.
    ///
    /// # Errors
    ///
    /// Returns an error for temporaries and hoisted locals, which are not allocated
    /// this way.
    pub fn allocate(&mut self, kind: LocalSlotKind, syntax_offset: i32, ordinal: u32) -> Result<u32> {
        if kind.code().is_none() {
            return Err(malformed_error!("Slot kind {:?} can not be allocated by name", kind));
        }
        self.push(SlotInfo::Named {
            kind,
            syntax_offset,
            ordinal,
        })
    }

    /// Allocate a temporary, reusing a released one when possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot count outgrows 32 bits.
    pub fn allocate_temp(&mut self) -> Result<u32> {
        if let Some(slot) = self.free_temps.pop() {
            return Ok(slot);
        }
        self.push(SlotInfo::Temp)
    }

    /// Return a temporary to the free list.
    ///
    /// # Errors
    ///
    /// Returns an error if `slot` is not a temporary or is already free.
    pub fn release_temp(&mut self, slot: u32) -> Result<()> {
        match self.slots.get(slot as usize) {
            Some(SlotInfo::Temp) if !self.free_temps.contains(&slot) => {
                self.free_temps.push(slot);
                Ok(())
            }
            Some(SlotInfo::Temp) => Err(malformed_error!("Temporary slot {} released twice", slot)),
            _ => Err(malformed_error!("Slot {} is not a temporary", slot)),
        }
    }

    fn push(&mut self, info: SlotInfo) -> Result<u32> {
        let slot = crate::utils::to_u32(self.slots.len())?;
        self.slots.push(info);
        Ok(slot)
    }

    /// All slots in index order.
    #[must_use]
    pub fn slots(&self) -> &[SlotInfo] {
        &self.slots
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot was allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn kind_codes_round_trip() {
        for kind in LocalSlotKind::iter() {
            if let Some(code) = kind.code() {
                assert_eq!(LocalSlotKind::from_code(code), Some(kind));
            }
        }
        assert_eq!(LocalSlotKind::COUNT, 14);
        assert_eq!(LocalSlotKind::from_code(200), None);
    }

    #[test]
    fn default_attributes() {
        assert!(LocalSlotKind::UserDefined.default_attributes().is_empty());
        assert!(LocalSlotKind::LambdaDisplayClass.default_attributes().is_empty());
        assert_eq!(
            LocalSlotKind::ForEachEnumerator.default_attributes(),
            LocalAttributes::DEBUGGER_HIDDEN
        );
        assert!(!LocalSlotKind::StateMachineHoisted.has_slot());
    }

    #[test]
    fn slots_are_monotonic() {
        let mut slots = SlotAllocator::new();
        assert_eq!(slots.allocate(LocalSlotKind::UserDefined, 10, 0).unwrap(), 0);
        assert_eq!(slots.allocate(LocalSlotKind::UserDefined, 30, 0).unwrap(), 1);
        assert_eq!(slots.allocate(LocalSlotKind::UserDefined, 30, 1).unwrap(), 2);
        assert!(slots.allocate(LocalSlotKind::Temp, 0, 0).is_err());
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn temps_are_reused() {
        let mut slots = SlotAllocator::new();
        let t0 = slots.allocate_temp().unwrap();
        let local = slots.allocate(LocalSlotKind::UserDefined, 5, 0).unwrap();
        slots.release_temp(t0).unwrap();
        let t1 = slots.allocate_temp().unwrap();

        assert_eq!(t0, t1);
        assert_eq!(local, 1);
        assert_eq!(slots.slots(), &[SlotInfo::Temp, SlotInfo::Named {
            kind: LocalSlotKind::UserDefined,
            syntax_offset: 5,
            ordinal: 0,
        }]);

        slots.release_temp(t1).unwrap();
        assert!(slots.release_temp(t1).is_err());
        assert!(slots.release_temp(local).is_err());
    }
}
