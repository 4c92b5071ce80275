//! Dynamic type flags for locals and constants.
//!
//! One flag per position of the flattened type signature; a set flag marks a position
//! whose type is `dynamic`. `dynamic[]` becomes `[false, true]`,
//! `Dictionary<int, dynamic>` becomes `[false, false, true]`.

use std::fmt;

/// Per-position dynamic flags of one local or constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DynamicFlags(Vec<bool>);

impl DynamicFlags {
    /// Wrap a flag list.
    #[must_use]
    pub fn new(flags: Vec<bool>) -> Self {
        DynamicFlags(flags)
    }

    /// Flags for a plain `dynamic` typed variable.
    #[must_use]
    pub fn dynamic() -> Self {
        DynamicFlags(vec![true])
    }

    /// Number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no flag is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The flags.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Returns `true` if any position is dynamic.
    #[must_use]
    pub fn any(&self) -> bool {
        self.0.iter().any(|flag| *flag)
    }

    /// The flags, or an empty list when there are more than `max` of them.
    ///
    /// Oversized lists are never truncated.
    #[must_use]
    pub fn capped(&self, max: usize) -> DynamicFlags {
        if self.0.len() > max {
            tracing::trace!(count = self.0.len(), max, "dynamic flags exceed limit, emitting empty");
            DynamicFlags::default()
        } else {
            self.clone()
        }
    }
}

impl From<Vec<bool>> for DynamicFlags {
    fn from(flags: Vec<bool>) -> Self {
        DynamicFlags(flags)
    }
}

impl fmt::Display for DynamicFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in &self.0 {
            f.write_str(if *flag { "1" } else { "0" })?;
        }
        Ok(())
    }
}
