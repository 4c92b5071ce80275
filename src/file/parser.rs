//! Cursor based decoder for debug-information blobs.
//!
//! The [`Parser`] walks a byte slice and reads the primitives that symbol blobs are made
//! of: fixed-size little-endian values, ECMA-335 compressed integers and fixed-width
//! UTF-16 name buffers. It is the reading counterpart of
//! [`crate::file::writer::BlobWriter`] and is used to decode sequence point blobs, custom
//! debug records and constant values.
//!
//! # Examples
//!
//! ```rust
//! use symscope::Parser;
//!
//! let data = [0x03, 0x80, 0x80, 0x7B];
//! let mut parser = Parser::new(&data);
//! assert_eq!(parser.read_compressed_uint()?, 3);
//! assert_eq!(parser.read_compressed_uint()?, 128);
//! assert_eq!(parser.read_compressed_int()?, -3);
//! assert!(!parser.has_more_data());
//! # Ok::<(), symscope::Error>(())
//! ```

use widestring::U16Str;

use crate::{
    file::io::{read_le_at, BlobIO},
    Error::OutOfBounds,
    Result,
};

/// A cursor over a byte slice with bounds-checked reads.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` while unread bytes remain.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Current read position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the move would pass the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if step > self.remaining() {
            return Err(OutOfBounds);
        }
        self.position += step;
        Ok(())
    }

    /// Read a little-endian primitive.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_le<T: BlobIO>(&mut self) -> Result<T> {
        read_le_at(self.data, &mut self.position)
    }

    /// Read `length` raw bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(OutOfBounds);
        }
        let slice = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(slice)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data ends inside the value or
    /// [`crate::Error::Malformed`] for an invalid lead byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        Ok(self.read_compressed_uint_sized()?.0)
    }

    /// Read a compressed signed integer as defined in ECMA-335 II.23.2.
    ///
    /// Signed values are stored rotated: the sign bit lives in the least significant
    /// bit and the width of the encoding determines how the value is sign extended.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data ends inside the value or
    /// [`crate::Error::Malformed`] for an invalid lead byte.
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let (raw, width) = self.read_compressed_uint_sized()?;
        let magnitude = raw >> 1;

        #[allow(clippy::cast_possible_wrap)]
        let value = if raw & 1 == 0 {
            magnitude as i32
        } else {
            match width {
                1 => magnitude as i32 - 0x40,
                2 => magnitude as i32 - 0x2000,
                _ => magnitude as i32 - 0x1000_0000,
            }
        };

        Ok(value)
    }

    fn read_compressed_uint_sized(&mut self) -> Result<(u32, u8)> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok((u32::from(first_byte), 1));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok((value, 2));
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok((value, 4));
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a fixed-width, zero padded UTF-16 buffer of `units` code units.
    ///
    /// Decoding stops at the first NUL unit; the remaining units are consumed.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is truncated.
    pub fn read_utf16_fixed(&mut self, units: usize) -> Result<String> {
        let mut buffer = Vec::with_capacity(units);
        for _ in 0..units {
            buffer.push(self.read_le::<u16>()?);
        }
        let end = buffer.iter().position(|&u| u == 0).unwrap_or(buffer.len());
        Ok(U16Str::from_slice(&buffer[..end]).to_string_lossy())
    }

    /// Read a NUL terminated UTF-16 string.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if no terminator is found.
    pub fn read_utf16_terminated(&mut self) -> Result<String> {
        let mut buffer = Vec::new();
        loop {
            let unit = self.read_le::<u16>()?;
            if unit == 0 {
                break;
            }
            buffer.push(unit);
        }
        Ok(U16Str::from_slice(&buffer).to_string_lossy())
    }
}
