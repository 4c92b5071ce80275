//! Event-driven builder for one method's debug information.
//!
//! The code generator drives a [`MethodDebugInfoBuilder`] while it emits the method body:
//! every event arrives in program order and is applied immediately. Shared session
//! state (documents, sources) is only touched through atomic registrations, so a builder
//! that fails half way leaves nothing behind but its own error.

use crate::{
    debuginfo::{
        constants::ConstantRecord,
        customdebuginformation::HoistedScope,
        importscope::{ImportLevels, ImportRecord},
        locals::{LocalDeclaration, LocalRecord, SlotAllocator},
        method::{MethodDebugInfo, MethodIdentity, MethodKind},
        scope::{ScopeId, ScopeTree},
        sequencepoints::{HiddenReason, SequencePointTable},
        session::DebugInfoSession,
        source::{RawSpan, ResolvedSpan},
    },
    Result,
};

/// Accumulates the events of one method.
pub struct MethodDebugInfoBuilder<'a> {
    session: &'a DebugInfoSession,
    identity: MethodIdentity,
    kind: MethodKind,
    scopes: ScopeTree,
    sequence_points: SequencePointTable,
    slots: SlotAllocator,
    hoisted_scopes: Vec<HoistedScope>,
}

impl<'a> MethodDebugInfoBuilder<'a> {
    /// Start a method. The root scope is open at offset 0.
    #[must_use]
    pub fn new(session: &'a DebugInfoSession, identity: MethodIdentity, kind: MethodKind) -> Self {
        MethodDebugInfoBuilder {
            session,
            identity,
            kind,
            scopes: ScopeTree::new(),
            sequence_points: SequencePointTable::new(),
            slots: SlotAllocator::new(),
            hoisted_scopes: Vec::new(),
        }
    }

    /// The method being built.
    #[must_use]
    pub fn identity(&self) -> &MethodIdentity {
        &self.identity
    }

    /// Innermost open scope.
    #[must_use]
    pub fn current_scope(&self) -> ScopeId {
        self.scopes.current()
    }

    /// Enter a block at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidScope`] if the block would escape its parent or
    /// overlap its previous sibling.
    pub fn begin_scope(&mut self, offset: u32) -> Result<ScopeId> {
        self.scopes.begin(offset)
    }

    /// Leave the innermost block at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidScope`] if no block is open or `offset` is invalid.
    pub fn end_scope(&mut self, offset: u32) -> Result<ScopeId> {
        self.scopes.end(offset)
    }

    /// Map `offset` to the source range of `span`.
    ///
    /// A span under `#line hidden` becomes a hidden point. Returns `false` when a point
    /// already exists at `offset`.
    ///
    /// # Errors
    /// Returns an error for an unknown source or a decreasing offset.
    pub fn sequence_point(&mut self, offset: u32, span: RawSpan) -> Result<bool> {
        match self.session.resolver().resolve(span)? {
            ResolvedSpan::Visible(resolution) => {
                self.sequence_points.push_visible(offset, &resolution)
            }
            ResolvedSpan::Hidden { document } => {
                self.sequence_points
                    .push_hidden(offset, Some(document), HiddenReason::Directive)
            }
        }
    }

    /// Insert a zero-width point at the start of the last visible point.
    ///
    /// Unlike [`MethodDebugInfoBuilder::sequence_point`] this is accepted at an offset
    /// that already has a point, for nested synthetic code such as a catch filter.
    ///
    /// # Errors
    /// Returns [`crate::Error::SequencePointOrder`] for a decreasing offset.
    pub fn same_as_previous_sequence_point(&mut self, offset: u32) -> Result<bool> {
        self.sequence_points.push_same_as_previous(offset)
    }

    /// Insert a hidden point at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::SequencePointOrder`] for a decreasing offset.
    pub fn hidden_sequence_point(&mut self, offset: u32, reason: HiddenReason) -> Result<bool> {
        self.sequence_points.push_hidden(offset, None, reason)
    }

    /// Declare a named local in the innermost open scope and return its slot.
    ///
    /// # Errors
    /// See [`MethodDebugInfoBuilder::declare_local_in`].
    pub fn declare_local(&mut self, declaration: LocalDeclaration) -> Result<u32> {
        let scope = self.scopes.current();
        self.declare_local_in(scope, declaration)
    }

    /// Declare a named local in `scope` and return its slot.
    ///
    /// # Errors
    /// Returns an error for temporaries and hoisted locals (use
    /// [`MethodDebugInfoBuilder::allocate_temp`] and
    /// [`MethodDebugInfoBuilder::hoisted_local_scope`]) and for closed scopes.
    pub fn declare_local_in(&mut self, scope: ScopeId, declaration: LocalDeclaration) -> Result<u32> {
        let LocalDeclaration {
            name,
            kind,
            syntax_offset,
            ordinal,
            attributes,
            dynamic_flags,
            live_range,
        } = declaration;

        let slot = self.slots.allocate(kind, syntax_offset, ordinal)?;
        let (live_start, live_end) = live_range.unwrap_or((0, 0));
        let record = LocalRecord {
            name,
            slot,
            live_start,
            live_end,
            attributes: attributes.unwrap_or_else(|| kind.default_attributes()),
            kind,
            dynamic_flags,
        };
        self.scopes.add_local(scope, record, live_range.is_some())?;
        Ok(slot)
    }

    /// Allocate a temporary slot. Temporaries never appear in the locals list.
    ///
    /// # Errors
    /// Returns an error if the slot count outgrows 32 bits.
    pub fn allocate_temp(&mut self) -> Result<u32> {
        self.slots.allocate_temp()
    }

    /// Release a temporary for reuse.
    ///
    /// # Errors
    /// Returns an error if `slot` is not a live temporary.
    pub fn release_temp(&mut self, slot: u32) -> Result<()> {
        self.slots.release_temp(slot)
    }

    /// Declare a constant in the innermost open scope.
    ///
    /// Returns `false` when the constant was dropped for being an oversized string.
    ///
    /// # Errors
    /// See [`MethodDebugInfoBuilder::declare_constant_in`].
    pub fn declare_constant(&mut self, record: ConstantRecord) -> Result<bool> {
        let scope = self.scopes.current();
        self.declare_constant_in(scope, record)
    }

    /// Declare a constant in `scope`.
    ///
    /// String constants longer than the configured maximum are dropped without a
    /// diagnostic; the symbol record they would need has a fixed capacity.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidScope`] if `scope` is closed.
    pub fn declare_constant_in(&mut self, scope: ScopeId, record: ConstantRecord) -> Result<bool> {
        let max = self.session.config().max_constant_string_len;
        if record.is_oversized(max) {
            tracing::trace!(
                method = %self.identity,
                constant = %record.name,
                max,
                "dropping oversized string constant"
            );
            return Ok(false);
        }
        self.scopes.add_constant(scope, record)?;
        Ok(true)
    }

    /// Declare an import in the innermost open scope.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidScope`] if the scope is closed.
    pub fn declare_import(&mut self, record: ImportRecord) -> Result<()> {
        let scope = self.scopes.current();
        self.scopes.add_import(scope, record)
    }

    /// Declare an import in `scope`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidScope`] if `scope` is closed.
    pub fn declare_import_in(&mut self, scope: ScopeId, record: ImportRecord) -> Result<()> {
        self.scopes.add_import(scope, record)
    }

    /// Record the IL range of the next hoisted local and return its index.
    ///
    /// `None` marks a hoisted local without a scope (written as `(0, 0)`).
    pub fn hoisted_local_scope(&mut self, range: Option<(u32, u32)>) -> usize {
        let (start, end) = range.unwrap_or((0, 0));
        self.hoisted_scopes.push(HoistedScope { start, end });
        self.hoisted_scopes.len() - 1
    }

    /// Close the root scope at `il_length` and produce the method's record.
    ///
    /// `MoveNext` methods get a hidden point at offset 0 when none was reported there.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidScope`] for unclosed or overlong scopes and an error
    /// if a sequence point lies past the end of the body.
    pub fn finish(mut self, il_length: u32) -> Result<MethodDebugInfo> {
        if let Some(last) = self.sequence_points.last_offset() {
            if last >= il_length && il_length > 0 {
                return Err(malformed_error!(
                    "Sequence point at 0x{:x} lies past the end of {} (0x{:x})",
                    last,
                    self.identity,
                    il_length
                ));
            }
        }

        if matches!(self.kind, MethodKind::StateMachineMoveNext { .. }) {
            self.sequence_points.ensure_hidden_at_start();
        }
        self.sequence_points.backfill_documents();

        let imports = ImportLevels::new(self.scopes.import_levels());
        let root_scope = self.scopes.finish(il_length)?;

        tracing::trace!(
            method = %self.identity,
            sequence_points = self.sequence_points.len(),
            slots = self.slots.len(),
            "method debug info built"
        );

        Ok(MethodDebugInfo {
            identity: self.identity,
            kind: self.kind,
            sequence_points: self.sequence_points.entries().to_vec(),
            root_scope,
            imports,
            slots: self.slots.slots().to_vec(),
            hoisted_scopes: self.hoisted_scopes,
            il_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        debuginfo::{
            config::EmitConfig,
            constants::ConstantValue,
            locals::{LocalAttributes, LocalSlotKind},
            source::{LineDirective, SourceText},
        },
        Error,
    };

    fn session() -> DebugInfoSession {
        DebugInfoSession::new(EmitConfig::default())
    }

    #[test]
    fn locals_get_slots_and_scope_ranges() {
        let session = session();
        let mut builder =
            MethodDebugInfoBuilder::new(&session, MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);

        assert_eq!(builder.declare_local(LocalDeclaration::user("a", 10)).unwrap(), 0);
        let temp = builder.allocate_temp().unwrap();
        builder.begin_scope(2).unwrap();
        assert_eq!(builder.declare_local(LocalDeclaration::user("b", 20)).unwrap(), 2);
        builder.end_scope(6).unwrap();
        builder.release_temp(temp).unwrap();
        assert_eq!(builder.allocate_temp().unwrap(), temp);

        let info = builder.finish(8).unwrap();
        assert_eq!(info.slots.len(), 3);
        assert_eq!(info.local_count(), 2);
        let a = &info.root_scope.locals[0];
        assert_eq!((a.slot, a.live_start, a.live_end), (0, 0, 8));
        let b = &info.root_scope.children[0].locals[0];
        assert_eq!((b.slot, b.live_start, b.live_end), (2, 2, 6));
        assert_eq!(b.attributes, LocalAttributes::empty());
    }

    #[test]
    fn hoisted_and_temp_kinds_are_rejected() {
        let session = session();
        let mut builder =
            MethodDebugInfoBuilder::new(&session, MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        assert!(builder
            .declare_local(LocalDeclaration::new("t", LocalSlotKind::Temp, 0))
            .is_err());
        assert!(builder
            .declare_local(LocalDeclaration::new("h", LocalSlotKind::StateMachineHoisted, 0))
            .is_err());
        assert!(!LocalSlotKind::Temp.is_declarable());
        assert!(LocalSlotKind::Using.is_declarable());
    }

    #[test]
    fn oversized_string_constant_is_dropped() {
        let session = session();
        let mut builder =
            MethodDebugInfoBuilder::new(&session, MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        let max = session.config().max_constant_string_len;

        let fits = ConstantRecord::new("s", ConstantValue::String("a".repeat(max)));
        let too_long = ConstantRecord::new("t", ConstantValue::String("a".repeat(max + 1)));
        assert!(builder.declare_constant(fits).unwrap());
        assert!(!builder.declare_constant(too_long).unwrap());

        let info = builder.finish(1).unwrap();
        assert_eq!(info.root_scope.constants.len(), 1);
        assert!(!session.diagnostics().has_any());
    }

    #[test]
    fn move_next_gets_hidden_entry_point() {
        let session = session();
        let source = session
            .add_source(SourceText::new("a.cs", "class C {\n  void M() { }\n}\n"), &[], &[])
            .unwrap();
        let mut builder = MethodDebugInfoBuilder::new(
            &session,
            MethodIdentity::new("C.<M>d__0", "MoveNext", 2),
            MethodKind::StateMachineMoveNext {
                kickoff: crate::debuginfo::token::Token::method_def(1),
            },
        );
        builder
            .sequence_point(7, RawSpan::new(source, 19, 20))
            .unwrap();

        let info = builder.finish(10).unwrap();
        assert_eq!(info.sequence_points.len(), 2);
        assert!(info.sequence_points[0].is_hidden());
        assert_eq!(info.sequence_points[0].il_offset, 0);
        assert_eq!(info.sequence_points[0].document, info.sequence_points[1].document);
    }

    #[test]
    fn hidden_directive_spans_become_hidden_points() {
        let session = session();
        let text = "a();\n#line hidden\nb();\n";
        let source = session
            .add_source(
                SourceText::new("a.cs", text),
                &[LineDirective::hidden_at(2)],
                &[],
            )
            .unwrap();
        let mut builder =
            MethodDebugInfoBuilder::new(&session, MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        builder.sequence_point(0, RawSpan::new(source, 0, 4)).unwrap();
        builder
            .sequence_point(4, RawSpan::new(source, 18, 22))
            .unwrap();

        let info = builder.finish(8).unwrap();
        assert!(!info.sequence_points[0].is_hidden());
        assert_eq!(
            info.sequence_points[1].hidden_reason,
            Some(HiddenReason::Directive)
        );
    }

    #[test]
    fn errors_propagate() {
        let session = session();
        let mut builder =
            MethodDebugInfoBuilder::new(&session, MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
        builder.hidden_sequence_point(4, HiddenReason::Generated).unwrap();
        assert!(matches!(
            builder.hidden_sequence_point(2, HiddenReason::Generated),
            Err(Error::SequencePointOrder { offset: 2, previous: 4 })
        ));
        assert!(matches!(
            builder.sequence_point(6, RawSpan::new(crate::debuginfo::source::SourceId(9), 0, 1)),
            Err(Error::UnknownSource(9))
        ));
        builder.begin_scope(1).unwrap();
        assert!(matches!(builder.finish(8), Err(Error::InvalidScope { .. })));
    }
}
