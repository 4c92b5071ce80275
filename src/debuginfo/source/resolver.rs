//! Span resolution: raw byte offsets to documents, lines and columns.

use crate::{
    debuginfo::{
        documents::{DocumentId, DocumentTable},
        source::{directives::MappedLine, PathNormalizer, SourceId, SourceTable},
    },
    Error, Result,
};

/// Byte range `[start, end)` inside one registered source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpan {
    /// Source the offsets refer to
    pub source: SourceId,
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl RawSpan {
    /// Create a span.
    #[must_use]
    pub fn new(source: SourceId, start: usize, end: usize) -> Self {
        RawSpan { source, start, end }
    }
}

/// A visible span: document plus 1-based line/column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanResolution {
    /// Document the span is attributed to
    pub document: DocumentId,
    /// 1-based start line
    pub start_line: u32,
    /// 1-based start column (UTF-16 units)
    pub start_column: u32,
    /// 1-based end line
    pub end_line: u32,
    /// 1-based end column (UTF-16 units)
    pub end_column: u32,
}

/// Result of resolving a raw span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSpan {
    /// Debuggable span
    Visible(SpanResolution),
    /// Under `#line hidden`; `document` is the file of the surrounding mapping
    Hidden {
        /// Document the hidden point refers to
        document: DocumentId,
    },
}

impl ResolvedSpan {
    /// Document either variant refers to.
    #[must_use]
    pub fn document(&self) -> DocumentId {
        match self {
            ResolvedSpan::Visible(span) => span.document,
            ResolvedSpan::Hidden { document } => *document,
        }
    }
}

/// Resolves raw spans against the registered sources.
///
/// Documents are created on first reference, including files that only exist through
/// `#line "file"` mappings.
pub struct SpanResolver<'a> {
    sources: &'a SourceTable,
    documents: &'a DocumentTable,
    normalizer: &'a PathNormalizer,
}

impl<'a> SpanResolver<'a> {
    /// Create a resolver over shared session state.
    #[must_use]
    pub fn new(
        sources: &'a SourceTable,
        documents: &'a DocumentTable,
        normalizer: &'a PathNormalizer,
    ) -> Self {
        SpanResolver {
            sources,
            documents,
            normalizer,
        }
    }

    /// Resolve `span`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSource`] for a source id that was never registered.
    pub fn resolve(&self, span: RawSpan) -> Result<ResolvedSpan> {
        let entry = self
            .sources
            .get(span.source)
            .ok_or(Error::UnknownSource(span.source.0))?;

        let end = span.end.max(span.start);
        let (start_line, start_column) = entry.text.line_col(span.start);
        let (end_line, end_column) = entry.text.line_col(end);

        let start = entry.directives.map_line(start_line, start_line);
        let end = entry.directives.map_line(start_line, end_line);

        match (start, end) {
            (
                MappedLine::Visible { file, line },
                MappedLine::Visible {
                    line: mapped_end, ..
                },
            ) => {
                let document = self.document_for(&entry.normalized_path, file.as_deref())?;
                Ok(ResolvedSpan::Visible(SpanResolution {
                    document,
                    start_line: line,
                    start_column,
                    end_line: mapped_end,
                    end_column,
                }))
            }
            (MappedLine::Hidden { file }, _) | (_, MappedLine::Hidden { file }) => {
                let document = self.document_for(&entry.normalized_path, file.as_deref())?;
                Ok(ResolvedSpan::Hidden { document })
            }
        }
    }

    fn document_for(&self, physical: &str, mapped: Option<&str>) -> Result<DocumentId> {
        match mapped {
            Some(file) => self.documents.get_or_create(&self.normalizer.normalize(file)),
            None => self.documents.get_or_create(physical),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuginfo::{
        diagnostics::Diagnostics,
        source::{LineDirective, SourceText},
    };

    fn setup(text: &str, directives: &[LineDirective]) -> (SourceTable, SourceId, PathNormalizer) {
        let normalizer = PathNormalizer::new(Some("/src".to_string()));
        let table = SourceTable::new();
        let diagnostics = Diagnostics::new();
        let id = table
            .add(SourceText::new("main.cs", text), directives, &normalizer, &diagnostics)
            .unwrap();
        (table, id, normalizer)
    }

    #[test]
    fn resolves_physical_span() {
        let (sources, id, normalizer) = setup("class C\n{\n  void M() { }\n}", &[]);
        let documents = DocumentTable::new();
        let resolver = SpanResolver::new(&sources, &documents, &normalizer);

        let resolved = resolver.resolve(RawSpan::new(id, 12, 20)).unwrap();
        let ResolvedSpan::Visible(span) = resolved else {
            panic!("expected visible span");
        };
        assert_eq!(documents.path(span.document), Some("/src/main.cs"));
        assert_eq!((span.start_line, span.start_column), (3, 3));
        assert_eq!((span.end_line, span.end_column), (3, 11));
    }

    #[test]
    fn remapped_and_hidden_spans() {
        let text = "a\n#line 20 \"gen.cs\"\nb\n#line hidden\nc\n";
        let (sources, id, normalizer) = setup(
            text,
            &[
                LineDirective::numbered_at(2, 20, Some("gen.cs")),
                LineDirective::hidden_at(4),
            ],
        );
        let documents = DocumentTable::new();
        let resolver = SpanResolver::new(&sources, &documents, &normalizer);

        let b_offset = text.find('b').unwrap();
        let ResolvedSpan::Visible(span) = resolver
            .resolve(RawSpan::new(id, b_offset, b_offset + 1))
            .unwrap()
        else {
            panic!("expected visible span");
        };
        assert_eq!(documents.path(span.document), Some("/src/gen.cs"));
        assert_eq!(span.start_line, 20);

        let c_offset = text.rfind('c').unwrap();
        let hidden = resolver
            .resolve(RawSpan::new(id, c_offset, c_offset + 1))
            .unwrap();
        assert_eq!(hidden, ResolvedSpan::Hidden { document: span.document });
    }

    #[test]
    fn unknown_source() {
        let sources = SourceTable::new();
        let documents = DocumentTable::new();
        let normalizer = PathNormalizer::default();
        let resolver = SpanResolver::new(&sources, &documents, &normalizer);
        assert!(matches!(
            resolver.resolve(RawSpan::new(SourceId(3), 0, 0)),
            Err(Error::UnknownSource(3))
        ));
    }
}
