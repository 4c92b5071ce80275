//! Per-method debug information.
//!
//! A [`MethodDebugInfoBuilder`] is created for each method the code generator emits
//! (see [`crate::debuginfo::session::DebugInfoSession::method_builder`]). It consumes the
//! generator's side-channel events and produces a [`MethodDebugInfo`]:
//!
//! ```text
//! begin_scope / end_scope        -> scope tree
//! sequence_point / hidden_...    -> sequence point table
//! declare_local / allocate_temp  -> slots and locals
//! declare_constant               -> constants (oversized strings dropped)
//! declare_import                 -> import levels
//! hoisted_local_scope            -> state machine hoisted scopes
//! finish(il_length)              -> MethodDebugInfo
//! ```

mod builder;
mod info;
mod types;

pub use builder::MethodDebugInfoBuilder;
pub use info::MethodDebugInfo;
pub use types::{MethodIdentity, MethodKind};
