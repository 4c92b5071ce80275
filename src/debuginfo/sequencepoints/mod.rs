//! Sequence points: IL offset to source range mappings.
//!
//! A method builder appends points in program order through [`SequencePointTable`].
//! After document ids are assigned, the emitter turns them into [`SequencePoint`]s,
//! which is also what the blob decoder produces.
//!
//! # Ordering
//!
//! - Offsets must never decrease; a lower offset than the last accepted one is
//!   [`crate::Error::SequencePointOrder`].
//! - A second point at an already used offset is dropped; the first one stays
//!   authoritative.
//! - A "same as previous" point ([`SequencePointTable::push_same_as_previous`]) is
//!   exempt from that drop. It is a zero-width span at the start of the last visible
//!   point and marks nested synthetic code such as a catch filter. At an already used
//!   offset it narrows the entry there instead of adding a second one.
//!
//! # Hidden points
//!
//! Hidden points carry the line `0xFEEFEE` and column 0. They mark compiler-introduced
//! control-flow seams with no user code (see [`HiddenReason`]) and spans under
//! `#line hidden`. They still reference a document, which is the one of the
//! surrounding code.

mod blob;

pub use blob::{encode_sequence_points, parse_sequence_points, SequencePointBlob};

use crate::{
    debuginfo::{documents::DocumentId, source::SpanResolution},
    Error, Result,
};

/// Line number marking a hidden sequence point.
pub const HIDDEN_LINE: u32 = 0x00FE_EFEE;

/// Why a hidden point was inserted.
///
/// Purely informational; every reason encodes identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HiddenReason {
    /// Span under `#line hidden`
    Directive,
    /// Jump into a loop's condition, emitted before the body
    LoopEntry,
    /// Back edge of a loop, the target of `continue`
    LoopBackEdge,
    /// Dispatch jump table of a state machine
    StateMachineDispatch,
    /// Top of a resumable state machine method
    ResumePoint,
    /// Jump past a `finally` block
    FinallyEpilogue,
    /// Dispatch into an exception handler
    HandlerDispatch,
    /// Any other generated code
    Generated,
}

/// Source range of a visible point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    /// 1-based start line
    pub start_line: u32,
    /// 1-based start column
    pub start_column: u32,
    /// 1-based end line
    pub end_line: u32,
    /// 1-based end column
    pub end_column: u32,
}

impl From<&SpanResolution> for SourceRange {
    fn from(span: &SpanResolution) -> Self {
        SourceRange {
            start_line: span.start_line,
            start_column: span.start_column,
            end_line: span.end_line,
            end_column: span.end_column,
        }
    }
}

/// Builder-side sequence point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePointEntry {
    /// IL offset
    pub il_offset: u32,
    /// Document; `None` for a hidden point reported before any document was seen
    pub document: Option<DocumentId>,
    /// Source range, `None` for hidden points
    pub range: Option<SourceRange>,
    /// Reason, for hidden points
    pub hidden_reason: Option<HiddenReason>,
}

impl SequencePointEntry {
    /// Returns `true` for hidden points.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.range.is_none()
    }
}

/// Per-method, append-only sequence point list.
#[derive(Debug, Clone, Default)]
pub struct SequencePointTable {
    entries: Vec<SequencePointEntry>,
}

impl SequencePointTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visible point.
    ///
    /// Returns `false` when a point already exists at `il_offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequencePointOrder`] if `il_offset` is lower than the last one.
    pub fn push_visible(&mut self, il_offset: u32, span: &SpanResolution) -> Result<bool> {
        self.push(SequencePointEntry {
            il_offset,
            document: Some(span.document),
            range: Some(SourceRange::from(span)),
            hidden_reason: None,
        })
    }

    /// Append a hidden point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequencePointOrder`] if `il_offset` is lower than the last one.
    pub fn push_hidden(
        &mut self,
        il_offset: u32,
        document: Option<DocumentId>,
        reason: HiddenReason,
    ) -> Result<bool> {
        let document = document.or_else(|| self.entries.last().and_then(|e| e.document));
        self.push(SequencePointEntry {
            il_offset,
            document,
            range: None,
            hidden_reason: Some(reason),
        })
    }

    /// Append a zero-width point at the start of the last visible point.
    ///
    /// Without an earlier visible point this records a hidden point instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequencePointOrder`] if `il_offset` is lower than the last one.
    pub fn push_same_as_previous(&mut self, il_offset: u32) -> Result<bool> {
        let Some(anchor) = self.entries.iter().rev().find(|e| !e.is_hidden()).copied() else {
            return self.push_hidden(il_offset, None, HiddenReason::Generated);
        };
        let entry = SequencePointEntry {
            il_offset,
            document: anchor.document,
            range: anchor.range.map(|range| SourceRange {
                start_line: range.start_line,
                start_column: range.start_column,
                end_line: range.start_line,
                end_column: range.start_column,
            }),
            hidden_reason: None,
        };

        if let Some(last) = self.entries.last_mut().filter(|last| last.il_offset == il_offset) {
            *last = entry;
            return Ok(true);
        }
        self.push(entry)
    }

    fn push(&mut self, entry: SequencePointEntry) -> Result<bool> {
        if let Some(last) = self.entries.last() {
            if entry.il_offset < last.il_offset {
                return Err(Error::SequencePointOrder {
                    offset: entry.il_offset,
                    previous: last.il_offset,
                });
            }
            if entry.il_offset == last.il_offset {
                tracing::trace!(
                    il_offset = entry.il_offset,
                    "duplicate sequence point offset, keeping the first"
                );
                return Ok(false);
            }
        }
        self.entries.push(entry);
        Ok(true)
    }

    /// Make sure a hidden point exists at offset 0.
    ///
    /// Used for resumable state machine methods, whose entry is the dispatch code.
    pub fn ensure_hidden_at_start(&mut self) {
        if self.entries.first().is_some_and(|e| e.il_offset == 0) {
            return;
        }
        let document = self.entries.iter().find_map(|e| e.document);
        self.entries.insert(
            0,
            SequencePointEntry {
                il_offset: 0,
                document,
                range: None,
                hidden_reason: Some(HiddenReason::ResumePoint),
            },
        );
    }

    /// Give hidden points reported before any document the first document that follows.
    pub fn backfill_documents(&mut self) {
        let mut next = None;
        for entry in self.entries.iter_mut().rev() {
            match entry.document {
                Some(document) => next = Some(document),
                None => entry.document = next,
            }
        }
    }

    /// The points, ascending by offset.
    #[must_use]
    pub fn entries(&self) -> &[SequencePointEntry] {
        &self.entries
    }

    /// Offset of the last point.
    #[must_use]
    pub fn last_offset(&self) -> Option<u32> {
        self.entries.last().map(|e| e.il_offset)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no point was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents referenced, in order of first reference.
    pub fn documents(&self) -> impl Iterator<Item = DocumentId> + '_ {
        let mut seen = Vec::new();
        self.entries.iter().filter_map(move |e| {
            let document = e.document?;
            if seen.contains(&document) {
                None
            } else {
                seen.push(document);
                Some(document)
            }
        })
    }
}

/// An emitted sequence point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePoint {
    /// Offset in the method's IL stream.
    pub il_offset: u32,
    /// 1-based file id; 0 when the method references no document.
    pub document: u32,
    /// Starting line in the source file.
    pub start_line: u32,
    /// Starting column in the source file.
    pub start_col: u32,
    /// Ending line in the source file.
    pub end_line: u32,
    /// Ending column in the source file.
    pub end_col: u32,
    /// True if this is a hidden sequence point (start_line == 0xFEEFEE).
    pub is_hidden: bool,
}

impl SequencePoint {
    /// Hidden point at `il_offset` in `document`.
    #[must_use]
    pub fn hidden(il_offset: u32, document: u32) -> Self {
        SequencePoint {
            il_offset,
            document,
            start_line: HIDDEN_LINE,
            start_col: 0,
            end_line: HIDDEN_LINE,
            end_col: 0,
            is_hidden: true,
        }
    }

    /// Visible point at `il_offset`.
    #[must_use]
    pub fn visible(il_offset: u32, document: u32, range: SourceRange) -> Self {
        SequencePoint {
            il_offset,
            document,
            start_line: range.start_line,
            start_col: range.start_column,
            end_line: range.end_line,
            end_col: range.end_column,
            is_hidden: false,
        }
    }
}

/// Collection of sequence points for a method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequencePoints(pub Vec<SequencePoint>);

impl SequencePoints {
    /// Returns the sequence point for a given IL offset, if any.
    #[must_use]
    pub fn find_by_il_offset(&self, il_offset: u32) -> Option<&SequencePoint> {
        self.0.iter().find(|sp| sp.il_offset == il_offset)
    }

    /// Number of hidden points.
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.0.iter().filter(|sp| sp.is_hidden).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::documents::DocumentTable;

    fn span(document: DocumentId, line: u32) -> SpanResolution {
        SpanResolution {
            document,
            start_line: line,
            start_column: 5,
            end_line: line,
            end_column: 10,
        }
    }

    #[test]
    fn same_as_previous_is_zero_width_and_exempt() {
        let documents = DocumentTable::new();
        let doc = documents.get_or_create("a.cs").unwrap();
        let mut table = SequencePointTable::new();

        assert!(table.push_same_as_previous(0).unwrap());
        assert!(table.entries()[0].is_hidden());

        assert!(table.push_visible(2, &span(doc, 7)).unwrap());
        assert!(table.push_same_as_previous(2).unwrap());
        assert!(table.push_same_as_previous(6).unwrap());
        assert_eq!(table.len(), 3);

        let zero = SourceRange {
            start_line: 7,
            start_column: 5,
            end_line: 7,
            end_column: 5,
        };
        assert_eq!(table.entries()[1].range, Some(zero));
        assert_eq!(table.entries()[2].range, Some(zero));
        assert!(table.push_same_as_previous(4).is_err());
    }

    #[test]
    fn monotonic_and_first_wins() {
        let documents = DocumentTable::new();
        let doc = documents.get_or_create("a.cs").unwrap();
        let mut table = SequencePointTable::new();

        assert!(table.push_visible(0, &span(doc, 1)).unwrap());
        assert!(table.push_visible(4, &span(doc, 2)).unwrap());
        assert!(!table.push_visible(4, &span(doc, 3)).unwrap());
        assert_eq!(table.entries()[1].range.unwrap().start_line, 2);

        let err = table.push_hidden(2, None, HiddenReason::Generated).unwrap_err();
        assert!(matches!(
            err,
            Error::SequencePointOrder {
                offset: 2,
                previous: 4
            }
        ));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn hidden_points_inherit_documents() {
        let documents = DocumentTable::new();
        let doc = documents.get_or_create("a.cs").unwrap();
        let mut table = SequencePointTable::new();

        table.push_hidden(0, None, HiddenReason::Generated).unwrap();
        table.push_visible(2, &span(doc, 3)).unwrap();
        table.push_hidden(6, None, HiddenReason::LoopBackEdge).unwrap();
        table.backfill_documents();

        assert!(table.entries().iter().all(|e| e.document == Some(doc)));
        assert!(table.entries()[2].is_hidden());
        assert_eq!(table.documents().count(), 1);
    }

    #[test]
    fn ensure_hidden_at_start() {
        let documents = DocumentTable::new();
        let doc = documents.get_or_create("a.cs").unwrap();
        let mut table = SequencePointTable::new();
        table.push_visible(7, &span(doc, 3)).unwrap();

        table.ensure_hidden_at_start();
        table.ensure_hidden_at_start();

        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].il_offset, 0);
        assert_eq!(table.entries()[0].hidden_reason, Some(HiddenReason::ResumePoint));
        assert_eq!(table.entries()[0].document, Some(doc));
    }

    #[test]
    fn find_by_offset() {
        let points = SequencePoints(vec![
            SequencePoint::hidden(0, 1),
            SequencePoint::visible(
                3,
                1,
                SourceRange {
                    start_line: 4,
                    start_column: 1,
                    end_line: 4,
                    end_column: 2,
                },
            ),
        ]);
        assert_eq!(points.find_by_il_offset(3).unwrap().start_line, 4);
        assert!(points.find_by_il_offset(1).is_none());
        assert_eq!(points.hidden_count(), 1);
    }
}
