//! Compilation-wide debug information state.
//!
//! A [`DebugInfoSession`] owns everything shared between methods: configuration, the
//! registered source texts, the checksum registry, the document table, extern alias
//! targets and collected diagnostics. All of it is safe to use from many threads at
//! once; methods are built in parallel by borrowing the session.
//!
//! # Example
//!
//! ```rust
//! use symscope::prelude::*;
//!
//! let session = DebugInfoSession::new(EmitConfig::debug());
//! let source = session.add_source(SourceText::new("a.cs", "class C { void M() { } }"), &[], &[])?;
//!
//! let mut method = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
//! method.sequence_point(0, RawSpan::new(source, 19, 20))?;
//! method.sequence_point(1, RawSpan::new(source, 21, 22))?;
//! let info = method.finish(2)?;
//!
//! let document = session.emit(&[info])?;
//! assert_eq!(document.files.len(), 1);
//! # Ok::<(), symscope::Error>(())
//! ```

use dashmap::DashMap;
use rayon::prelude::*;

use crate::{
    debuginfo::{
        checksum::{ChecksumPragma, ChecksumRegistry, DocumentChecksum},
        config::EmitConfig,
        diagnostics::Diagnostics,
        documents::{DocumentId, DocumentTable},
        method::{MethodDebugInfo, MethodDebugInfoBuilder, MethodIdentity, MethodKind},
        source::{LineDirective, PathNormalizer, SourceId, SourceTable, SourceText, SpanResolver},
        token::Token,
    },
    emit::{DebugInfoDocument, DocumentEmitter},
    Result,
};

/// Shared state of one compilation.
#[derive(Debug)]
pub struct DebugInfoSession {
    config: EmitConfig,
    normalizer: PathNormalizer,
    diagnostics: Diagnostics,
    checksums: ChecksumRegistry,
    documents: DocumentTable,
    declared: boxcar::Vec<DocumentId>,
    sources: SourceTable,
    extern_aliases: DashMap<String, String>,
    module_method: Option<Token>,
}

impl DebugInfoSession {
    /// Create a session.
    #[must_use]
    pub fn new(config: EmitConfig) -> Self {
        let normalizer = PathNormalizer::new(config.base_directory.clone());
        DebugInfoSession {
            config,
            normalizer,
            diagnostics: Diagnostics::new(),
            checksums: ChecksumRegistry::new(),
            documents: DocumentTable::new(),
            declared: boxcar::Vec::new(),
            sources: SourceTable::new(),
            extern_aliases: DashMap::new(),
            module_method: None,
        }
    }

    /// Methods without imports of their own forward to `token`.
    #[must_use]
    pub fn with_module_method(mut self, token: Token) -> Self {
        self.module_method = Some(token);
        self
    }

    /// Register a source text with the directives the parser found in it.
    ///
    /// The text is hashed with the configured algorithm. That hash wins over any
    /// `#pragma checksum` naming the same file, whether the pragma's source was added
    /// before or after this one. Files declared by a valid pragma become documents
    /// right away.
    ///
    /// # Errors
    /// Returns an error if a table outgrows 32-bit ids.
    pub fn add_source(
        &self,
        text: SourceText,
        directives: &[LineDirective],
        pragmas: &[ChecksumPragma],
    ) -> Result<SourceId> {
        let normalized = self.normalizer.normalize(text.path());
        let checksum = DocumentChecksum::compute(self.config.checksum_algorithm, text.text().as_bytes());
        self.checksums
            .register_computed(&normalized, checksum, &self.diagnostics);

        for pragma in pragmas {
            let registration =
                self.checksums
                    .register_pragma(&self.normalizer, text.path(), pragma, &self.diagnostics);
            if registration.is_some() {
                let document = self
                    .documents
                    .get_or_create(&self.normalizer.normalize(&pragma.path))?;
                self.declared.push(document);
            }
        }

        self.sources
            .add(text, directives, &self.normalizer, &self.diagnostics)
    }

    /// Map extern alias `alias` to the assembly identity it refers to.
    pub fn add_extern_alias(&self, alias: impl Into<String>, assembly: impl Into<String>) {
        self.extern_aliases.insert(alias.into(), assembly.into());
    }

    /// Assembly identity of extern alias `alias`.
    #[must_use]
    pub fn extern_alias_target(&self, alias: &str) -> Option<String> {
        self.extern_aliases.get(alias).map(|target| target.clone())
    }

    /// Start building the debug information of one method.
    #[must_use]
    pub fn method_builder(&self, identity: MethodIdentity, kind: MethodKind) -> MethodDebugInfoBuilder<'_> {
        MethodDebugInfoBuilder::new(self, identity, kind)
    }

    /// Build several methods in parallel.
    ///
    /// Results keep the order of `inputs`, which is the emission order used for
    /// document numbering and forwarding. The first failing method fails the batch.
    ///
    /// # Errors
    /// Returns the error of a failing `build` call.
    pub fn build_methods<T, F>(&self, inputs: &[T], build: F) -> Result<Vec<MethodDebugInfo>>
    where
        T: Sync,
        F: Fn(&Self, &T) -> Result<MethodDebugInfo> + Sync + Send,
    {
        inputs.par_iter().map(|input| build(self, input)).collect()
    }

    /// Turn finished methods, in emission order, into the output document.
    ///
    /// # Errors
    /// Returns an error if a method references a document this session never issued or
    /// a record does not fit its encoding.
    pub fn emit(&self, methods: &[MethodDebugInfo]) -> Result<DebugInfoDocument> {
        DocumentEmitter::new(self).emit(methods)
    }

    /// Span resolver over this session's sources and documents.
    #[must_use]
    pub fn resolver(&self) -> SpanResolver<'_> {
        SpanResolver::new(&self.sources, &self.documents, &self.normalizer)
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    /// Path normalizer built from the configured base directory.
    #[must_use]
    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Warnings collected so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Checksum registry.
    #[must_use]
    pub fn checksums(&self) -> &ChecksumRegistry {
        &self.checksums
    }

    /// Document table.
    #[must_use]
    pub fn documents(&self) -> &DocumentTable {
        &self.documents
    }

    /// Documents declared by `#pragma checksum`, in source-add order.
    ///
    /// Documents that only appeared while resolving spans are not listed; they reach
    /// the output only through the sequence points of emitted methods.
    pub fn declared_documents(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.declared.iter().map(|(_, id)| *id)
    }

    /// Registered sources.
    #[must_use]
    pub fn sources(&self) -> &SourceTable {
        &self.sources
    }

    /// Module-level import method, if configured.
    #[must_use]
    pub fn module_method(&self) -> Option<Token> {
        self.module_method
    }
}
