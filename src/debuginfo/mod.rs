//! Building debug information while code is generated.
//!
//! Everything that is collected before emission lives here. A compilation creates one
//! [`session::DebugInfoSession`], registers its source texts, then drives a
//! [`method::MethodDebugInfoBuilder`] per generated method with scope, local, constant,
//! import and sequence point events. Finished methods are handed to
//! [`crate::emit`] to produce the output document.
//!
//! # Layout
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`source`] | Source texts, `#line` directives, path normalization, span resolution |
//! | [`checksum`] | Checksums of physical files and `#pragma checksum` declarations |
//! | [`documents`] | Compilation-wide document table |
//! | [`sequencepoints`] | Per-method IL offset to source mapping and its blob encoding |
//! | [`scope`] | Lexical scope tree with locals and constants |
//! | [`locals`] | Slot allocation and local attributes |
//! | [`constants`] | Typed constant values |
//! | [`dynamic`] | Dynamic type flags |
//! | [`importscope`] | `using` context of a method |
//! | [`forwarding`] | Sharing import lists between methods |
//! | [`customdebuginformation`] | Legacy per-method custom debug records |
//! | [`method`] | Per-method builder and its finished result |
//! | [`session`] | Shared state of one compilation |

pub mod checksum;
pub mod config;
pub mod constants;
pub mod customdebuginformation;
pub mod diagnostics;
pub mod documents;
pub mod dynamic;
pub mod forwarding;
pub mod importscope;
pub mod locals;
pub mod method;
pub mod scope;
pub mod sequencepoints;
pub mod session;
pub mod source;
pub mod token;
