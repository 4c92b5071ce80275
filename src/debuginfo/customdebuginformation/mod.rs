//! Legacy custom debug information records.
//!
//! Per-method data that has no home in the classic symbol tables (import counts,
//! forwarding, state machine bookkeeping, `dynamic` locals and the edit-and-continue
//! slot map) travels as a single blob of versioned records.
//!
//! # Blob Format
//!
//! ```text
//! Blob   ::= version:u8(4) count:u8 pad:u8[2] Record*
//! Record ::= version:u8(4) kind:u8 reserved:u8 alignment:u8 size:u32 payload pad
//! ```
//!
//! `size` covers the 8-byte record header, the payload and the padding that rounds the
//! record up to a multiple of four bytes; `alignment` is the number of padding bytes.
//!
//! | Kind | Record | Payload |
//! |------|--------|---------|
//! | 0 | UsingInfo | `u16` level count, `u16` per level |
//! | 1 | ForwardInfo | `u32` method token |
//! | 2 | ForwardToModuleInfo | `u32` method token |
//! | 3 | StateMachineHoistedLocalScopes | `u32` count, `(u32, u32)` per slot |
//! | 4 | ForwardIterator | NUL terminated UTF-16 type name |
//! | 5 | DynamicLocals | `u32` count, 64 flag bytes + `u32` flag count + `u32` slot + 64 UTF-16 units per bucket |
//! | 6 | EncLocalSlotMap | optional `0xFF` baseline, then one entry per slot |

mod encoder;
mod parser;
mod types;

pub use encoder::{encode_custom_debug_info, SLOT_MAP_BASELINE_MARKER, SLOT_MAP_HAS_ORDINAL};
pub use parser::{parse_custom_debug_info, CustomDebugParser};
pub use types::*;
