//! Little-endian primitive conversions for debug-information blobs.
//!
//! Every value stored in a symbol blob is little-endian. The [`BlobIO`] trait gives the
//! [`crate::file::parser::Parser`] and [`crate::file::writer::BlobWriter`] a single generic
//! entry point for all fixed-size primitives, so neither has to carry one method per type.
//!
//! # Examples
//!
//! ```rust
//! use symscope::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00];
//! let mut offset = 0;
//! let first: u32 = read_le_at(&data, &mut offset)?;
//! let second: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second, offset), (1, 2, 6));
//! # Ok::<(), symscope::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

/// Fixed-size primitive that can be converted to and from little-endian bytes.
pub trait BlobIO: Sized + Copy {
    /// The byte array representation of the type
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Encode to little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_blob_io {
    ($($ty:ty => $n:expr),* $(,)?) => {
        $(
            impl BlobIO for $ty {
                type Bytes = [u8; $n];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_blob_io!(
    u8 => 1, i8 => 1,
    u16 => 2, i16 => 2,
    u32 => 4, i32 => 4,
    u64 => 8, i64 => 8,
    f32 => 4, f64 => 8,
);

/// Read a value at `offset` and advance the offset past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: BlobIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let end = offset.checked_add(type_len).ok_or(OutOfBounds)?;
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Read a value from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is too short.
pub fn read_le<T: BlobIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}
