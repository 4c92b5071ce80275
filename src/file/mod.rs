//! Low-level binary helpers for debug-information blobs.
//!
//! - [`io`] - endian-aware primitive conversions shared by reader and writer
//! - [`parser`] - cursor based decoder used for reading blobs back
//! - [`writer`] - append-only encoder producing blobs

pub mod io;
pub mod parser;
pub mod writer;
