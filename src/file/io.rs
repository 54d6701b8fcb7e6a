//! Low-level byte order and safe reading/writing utilities for class file parsing.
//!
//! The class file format stores every multi-byte quantity in big-endian order, so this
//! module only offers big-endian accessors. All reads are bounds-checked and
//! return [`crate::Error::OutOfBounds`] instead of panicking on short buffers.
//!
//! # Key Components
//!
//! - [`crate::file::io::ClassIO`] - Trait defining endian-aware conversion for primitive types
//! - [`crate::file::io::read_be`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_be_at`] - Read a value at an offset and advance the offset
//! - [`crate::file::io::push_be`] - Append a value to a growable buffer
//!
//! # Usage Examples
//!
//! ```rust
//! use serialver::file::io::{read_be_at, push_be};
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x3D];
//! let mut offset = 0;
//! let magic: u32 = read_be_at(&data, &mut offset)?;
//! let major: u16 = read_be_at(&data, &mut offset)?;
//! assert_eq!(magic, 0xCAFE_BABE);
//! assert_eq!(major, 61);
//!
//! let mut out = Vec::new();
//! push_be(&mut out, magic);
//! assert_eq!(out, [0xCA, 0xFE, 0xBA, 0xBE]);
//! # Ok::<(), serialver::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! All functions in this module are pure and can be called concurrently. Functions taking
//! an `offset` modify it, so each thread should use its own offset variable.

use crate::{Error::OutOfBounds, Result};

/// Trait for type-specific, endian-aware conversion of primitive values.
///
/// Each implementation names the fixed-size byte array matching the type (e.g. `[u8; 4]`
/// for `u32`), which the reading and writing functions use to move data in and out of
/// byte buffers without any unsafe code.
pub trait ClassIO: Sized {
    /// Byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
    /// Write T to a byte buffer in big-endian
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_class_io {
    ($($ty:ty),*) => {
        $(
            impl ClassIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_class_io!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Safely reads a value of type `T` in big-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be<T: ClassIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_be_at(data, &mut offset)
}

/// Safely reads a value of type `T` in big-endian byte order at a specific offset.
///
/// The offset is advanced by the size of `T` after a successful read and left untouched
/// on failure.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the offset position (will be advanced after reading)
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_be_at<T: ClassIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_be_bytes(read))
}

/// Appends a value of type `T` in big-endian byte order to a growable buffer.
pub fn push_be<T: ClassIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_be_bytes().as_ref());
}
