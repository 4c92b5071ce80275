//! Output side of the emitter.
//!
//! Finished methods are projected into a [`DebugInfoDocument`] by the
//! [`DocumentEmitter`]. The document has two renderings:
//!
//! - the XML form used for inspection and golden tests ([`to_xml`])
//! - the physical form pushed through a [`SymbolWriter`], by default the in-memory
//!   [`BlobSymbolWriter`]
//!
//! The physical form is all or nothing: a writer failure aborts the emit and no partial
//! container is handed out.

mod document;
mod emitter;
mod writer;
pub mod xml;

pub use document::{DebugInfoDocument, FileRecord, MethodRecord};
pub use emitter::DocumentEmitter;
pub use writer::{BlobSymbolWriter, SymbolWriter, CONTAINER_MAGIC, CONTAINER_VERSION};
pub use xml::to_xml;
