//! Source texts, `#line` directives and span resolution.
//!
//! The external parser hands every source text to the session together with the
//! directives it found. From then on the code generator refers to source positions only
//! through [`RawSpan`]s (source id plus byte offsets); this module turns those into
//! documents and line/column ranges.
//!
//! # Key Components
//!
//! - [`SourceText`] - text plus line-start table
//! - [`PathNormalizer`] - `.`/`..` folding against a base directory
//! - [`DirectiveMap`] - the per-source `#line` state machine
//! - [`SpanResolver`] - raw span to [`ResolvedSpan`]

mod directives;
mod path;
mod resolver;
mod text;

pub use directives::{
    DirectiveMap, DirectiveState, LineDirective, LineDirectiveKind, MappedLine, MAX_DIRECTIVE_LINE,
};
pub use path::PathNormalizer;
pub use resolver::{RawSpan, ResolvedSpan, SpanResolution, SpanResolver};
pub use text::SourceText;

use std::fmt;

use crate::{debuginfo::diagnostics::Diagnostics, Result};

/// Handle of a registered source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// A registered source with its precomputed mapping state.
#[derive(Debug)]
pub struct SourceEntry {
    /// The text
    pub text: SourceText,
    /// Normalized path of the physical file
    pub normalized_path: String,
    /// `#line` state machine
    pub directives: DirectiveMap,
}

/// Append-only store of source texts.
#[derive(Debug, Default)]
pub struct SourceTable {
    entries: boxcar::Vec<SourceEntry>,
}

impl SourceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        SourceTable {
            entries: boxcar::Vec::new(),
        }
    }

    /// Register a text and build its directive map.
    ///
    /// # Errors
    ///
    /// Returns an error if the table outgrows 32-bit ids.
    pub fn add(
        &self,
        text: SourceText,
        directives: &[LineDirective],
        normalizer: &PathNormalizer,
        diagnostics: &Diagnostics,
    ) -> Result<SourceId> {
        let normalized_path = normalizer.normalize(text.path());
        let directives = DirectiveMap::build(text.path(), directives, diagnostics);
        let index = self.entries.push(SourceEntry {
            text,
            normalized_path,
            directives,
        });
        Ok(SourceId(crate::utils::to_u32(index)?))
    }

    /// Entry for `id`.
    #[must_use]
    pub fn get(&self, id: SourceId) -> Option<&SourceEntry> {
        self.entries.get(id.0 as usize)
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if no source was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
