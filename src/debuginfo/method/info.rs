//! Finished per-method debug information.

use crate::debuginfo::{
    customdebuginformation::HoistedScope,
    documents::DocumentId,
    importscope::ImportLevels,
    locals::SlotInfo,
    method::{MethodIdentity, MethodKind},
    scope::Scope,
    sequencepoints::SequencePointEntry,
};

/// Everything recorded for one method, before document ids and forwarding are decided.
///
/// Produced by [`crate::debuginfo::method::MethodDebugInfoBuilder::finish`] and consumed
/// by the emitter. Values are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDebugInfo {
    /// Identity
    pub identity: MethodIdentity,
    /// Kind
    pub kind: MethodKind,
    /// Sequence points ascending by offset
    pub sequence_points: Vec<SequencePointEntry>,
    /// Root scope covering the whole body
    pub root_scope: Scope,
    /// Flattened imports, innermost level first
    pub imports: ImportLevels,
    /// Slot map, one entry per IL slot
    pub slots: Vec<SlotInfo>,
    /// Scopes of hoisted locals
    pub hoisted_scopes: Vec<HoistedScope>,
    /// Length of the IL body
    pub il_length: u32,
}

impl MethodDebugInfo {
    /// Documents referenced by sequence points, in order of first reference.
    pub fn documents(&self) -> impl Iterator<Item = DocumentId> + '_ {
        let mut seen = Vec::new();
        self.sequence_points.iter().filter_map(move |point| {
            let document = point.document?;
            if seen.contains(&document) {
                None
            } else {
                seen.push(document);
                Some(document)
            }
        })
    }

    /// Number of named locals in all scopes.
    #[must_use]
    pub fn local_count(&self) -> usize {
        self.root_scope.all_locals().count()
    }
}
