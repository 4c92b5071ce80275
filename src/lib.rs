// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

//! # symscope
//!
//! Debug-information emitter for managed-code compilers. While a compiler generates IL,
//! `symscope` collects what a debugger needs to map that IL back to source and writes it
//! out as a symbol document:
//!
//! - **Sequence points** - IL offset to source range mappings, including hidden points
//!   and `#line` remapping
//! - **Scopes and locals** - lexical scopes with local variables, slot numbers,
//!   attributes and typed constants
//! - **Imports** - the `using` context of every method, shared between methods through
//!   forwarding records
//! - **Documents** - normalized source paths with checksums from the file contents or
//!   `#pragma checksum`
//! - **Custom debug records** - state machine hoisted scopes, dynamic locals and the
//!   edit-and-continue slot map in the legacy CDI format
//!
//! ## Quick Start
//!
//! ```rust
//! use symscope::prelude::*;
//!
//! let session = DebugInfoSession::new(EmitConfig::debug());
//! let source = session.add_source(
//!     SourceText::new("a.cs", "class C { void M() { int x = 1; } }"),
//!     &[],
//!     &[],
//! )?;
//!
//! let mut method = session.method_builder(MethodIdentity::new("C", "M", 1), MethodKind::Ordinary);
//! method.declare_import(ImportRecord::namespace("System"))?;
//! method.sequence_point(0, RawSpan::new(source, 19, 20))?;
//! method.sequence_point(1, RawSpan::new(source, 21, 31))?;
//! method.declare_local(LocalDeclaration::user("x", 25))?;
//! method.sequence_point(3, RawSpan::new(source, 32, 33))?;
//! let info = method.finish(4)?;
//!
//! let document = session.emit(&[info])?;
//! let xml = document.to_xml()?;
//! assert!(xml.contains(r#"<local name="x" il_index="0" il_start="0x0" il_end="0x4" attributes="0"/>"#));
//!
//! let blob = document.to_blob()?;
//! assert!(!blob.is_empty());
//! # Ok::<(), symscope::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! A [`DebugInfoSession`] is shared by reference between threads. Methods are built in
//! parallel, each with its own builder; [`DebugInfoSession::build_methods`] does this on
//! the rayon pool and keeps the input order, which is the emission order.
//!
//! ## Errors and diagnostics
//!
//! Hard failures (a builder used out of order, a record that cannot be encoded, a
//! failing symbol writer) are returned as [`Error`]. Problems a compiler reports as
//! warnings, such as a malformed `#pragma checksum`, are collected in the session's
//! [`Diagnostics`] and never abort the emit.
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events at `debug` and `trace`
//! level and installs no subscriber.

#[macro_use]
pub(crate) mod error;

/// Low-level blob reading and writing.
pub mod file;

/// Formatting and conversion helpers.
pub mod utils;

/// Collecting debug information while code is generated.
///
/// # Key Types
///
/// - [`debuginfo::session::DebugInfoSession`] - compilation-wide state
/// - [`debuginfo::method::MethodDebugInfoBuilder`] - per-method event sink
/// - [`debuginfo::method::MethodDebugInfo`] - finished per-method result
pub mod debuginfo;

/// Producing the output document and its XML and physical forms.
pub mod emit;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use symscope::prelude::*;
///
/// let session = DebugInfoSession::new(EmitConfig::release());
/// assert!(!session.config().allows_enc_records());
/// ```
pub mod prelude;

/// `symscope` Result type
pub type Result<T> = std::result::Result<T, Error>;

/// `symscope` Error type
///
/// # Examples
///
/// ```rust
/// use symscope::{Error, Parser};
///
/// let mut parser = Parser::new(&[0xFF]);
/// match parser.read_compressed_uint() {
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {message}"),
///     Err(e) => println!("Error: {e}"),
///     Ok(value) => println!("{value}"),
/// }
/// ```
pub use error::Error;

/// Cursor based blob decoder.
pub use file::parser::Parser;

/// Warning collection shared by a session.
pub use debuginfo::diagnostics::{
    Diagnostic, DiagnosticCategory, Diagnostics, SourceLocation,
};

/// Entry points for building and emitting debug information.
pub use debuginfo::{
    config::{EmitConfig, TargetPlatform},
    method::{MethodDebugInfo, MethodDebugInfoBuilder, MethodIdentity, MethodKind},
    session::DebugInfoSession,
};

/// The output document and its writers.
pub use emit::{BlobSymbolWriter, DebugInfoDocument, FileRecord, MethodRecord, SymbolWriter};
