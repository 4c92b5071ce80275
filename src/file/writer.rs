//! Append-only encoder for debug-information blobs.
//!
//! [`BlobWriter`] is the writing counterpart of [`crate::file::parser::Parser`]. It grows a
//! byte buffer with little-endian primitives, ECMA-335 compressed integers and UTF-16
//! strings.
//!
//! # Examples
//!
//! ```rust
//! use symscope::{file::writer::BlobWriter, Parser};
//!
//! let mut writer = BlobWriter::new();
//! writer.write_compressed_uint(300)?;
//! writer.write_compressed_int(-5)?;
//! let bytes = writer.into_inner();
//!
//! let mut parser = Parser::new(&bytes);
//! assert_eq!(parser.read_compressed_uint()?, 300);
//! assert_eq!(parser.read_compressed_int()?, -5);
//! # Ok::<(), symscope::Error>(())
//! ```

use crate::{file::io::BlobIO, Result};

/// Largest value representable as a compressed unsigned integer.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// Growable little-endian blob encoder.
#[derive(Debug, Default, Clone)]
pub struct BlobWriter {
    buffer: Vec<u8>,
}

impl BlobWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Borrow the encoded bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the encoded bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Append a little-endian primitive.
    pub fn write_le<T: BlobIO>(&mut self, value: T) {
        self.buffer.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append `count` zero bytes.
    pub fn write_zeroes(&mut self, count: usize) {
        self.buffer.resize(self.buffer.len() + count, 0);
    }

    /// Append a compressed unsigned integer (ECMA-335 II.23.2).
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_compressed_uint(&mut self, value: u32) -> Result<()> {
        if value <= 0x7F {
            self.buffer.push(value as u8);
        } else if value <= 0x3FFF {
            self.buffer.push(((value >> 8) as u8) | 0x80);
            self.buffer.push(value as u8);
        } else if value <= MAX_COMPRESSED_UINT {
            self.buffer.push(((value >> 24) as u8) | 0xC0);
            self.buffer.push((value >> 16) as u8);
            self.buffer.push((value >> 8) as u8);
            self.buffer.push(value as u8);
        } else {
            return Err(malformed_error!(
                "Value 0x{:x} can not be stored as a compressed uint",
                value
            ));
        }
        Ok(())
    }

    /// Append a compressed signed integer (ECMA-335 II.23.2, rotated sign bit).
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `value` lies outside the 29-bit signed range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn write_compressed_int(&mut self, value: i32) -> Result<()> {
        let sign = u32::from(value < 0);

        let encoded = if (-0x40..0x40).contains(&value) {
            ((value as u32 & 0x3F) << 1) | sign
        } else if (-0x2000..0x2000).contains(&value) {
            ((value as u32 & 0x1FFF) << 1) | sign | 0x80_0000
        } else if (-0x1000_0000..0x1000_0000).contains(&value) {
            ((value as u32 & 0x0FFF_FFFF) << 1) | sign | 0x8000_0000
        } else {
            return Err(malformed_error!(
                "Value {} can not be stored as a compressed int",
                value
            ));
        };

        // Bits 31 and 23 are width markers, not payload.
        if encoded & 0x8000_0000 != 0 {
            let encoded = encoded & 0x7FFF_FFFF;
            self.buffer.push(((encoded >> 24) as u8) | 0xC0);
            self.buffer.push((encoded >> 16) as u8);
            self.buffer.push((encoded >> 8) as u8);
            self.buffer.push(encoded as u8);
        } else if encoded & 0x80_0000 != 0 {
            let encoded = encoded & 0x3FFF;
            self.buffer.push(((encoded >> 8) as u8) | 0x80);
            self.buffer.push(encoded as u8);
        } else {
            self.buffer.push(encoded as u8);
        }
        Ok(())
    }

    /// Append UTF-16 code units followed by a NUL terminator.
    pub fn write_utf16_terminated(&mut self, value: &str) {
        for unit in value.encode_utf16() {
            self.write_le(unit);
        }
        self.write_le(0u16);
    }

    /// Append exactly `units` UTF-16 code units, zero padded.
    ///
    /// Values that do not fit (including the terminator) are written as all zeroes.
    pub fn write_utf16_fixed(&mut self, value: &str, units: usize) {
        let encoded: Vec<u16> = value.encode_utf16().collect();
        if encoded.len() < units {
            for unit in &encoded {
                self.write_le(*unit);
            }
            self.write_zeroes((units - encoded.len()) * 2);
        } else {
            self.write_zeroes(units * 2);
        }
    }
}
