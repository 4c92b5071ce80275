//! Metadata tokens as they appear in symbol records.
//!
//! Debug information refers to methods (forwarding targets) and types (the static type of
//! a `null` constant) by their 32-bit metadata token: the table id in the high byte and the
//! 1-based row in the low 24 bits.
//!
//! # Examples
//!
//! ```rust
//! use symscope::debuginfo::token::Token;
//!
//! let token = Token::method_def(3);
//! assert_eq!(token.value(), 0x0600_0003);
//! assert_eq!(token.table(), 0x06);
//! assert_eq!(token.row(), 3);
//! assert_eq!(token.to_string(), "0x06000003");
//! ```

use std::fmt;

/// Table id of the MethodDef table.
pub const TABLE_METHOD_DEF: u8 = 0x06;

/// Table id of the TypeDef table.
pub const TABLE_TYPE_DEF: u8 = 0x02;

/// Table id of the TypeRef table.
pub const TABLE_TYPE_REF: u8 = 0x01;

/// A metadata token (table id + row).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u32);

impl Token {
    /// Create a token from its raw value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create a token from a table id and a 1-based row.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Token of the MethodDef row `row`.
    #[must_use]
    pub fn method_def(row: u32) -> Self {
        Self::from_parts(TABLE_METHOD_DEF, row)
    }

    /// Raw 32-bit value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Table id (high byte).
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Row index (low 24 bits).
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns `true` for the nil token.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
