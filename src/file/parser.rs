//! Cursor-based byte stream parser for class file decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a bounds-checked cursor over a
//! byte slice. The class file reader in [`crate::classfile`] is written entirely in terms of it:
//! fixed-width big-endian integers via [`crate::file::parser::Parser::read_be`] and borrowed
//! sub-slices (Utf8 payloads, attribute bodies) via [`crate::file::parser::Parser::read_bytes`].
//!
//! # Usage Examples
//!
//! ```rust
//! use serialver::Parser;
//!
//! let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x3D];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_be::<u32>()?, 0xCAFE_BABE);
//! assert_eq!(parser.read_be::<u16>()?, 0);
//! assert_eq!(parser.read_be::<u16>()?, 61);
//! assert!(!parser.has_more_data());
//! # Ok::<(), serialver::Error>(())
//! ```

use crate::{
    file::io::{read_be_at, ClassIO},
    Result,
};

/// A generic binary data parser for reading class file structures.
///
/// `Parser` keeps a position within a borrowed byte slice. Every read validates data
/// availability first, so truncated class files surface as [`crate::Error::OutOfBounds`]
/// rather than panics.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serialver::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let parser = Parser::new(&data);
    /// assert_eq!(parser.remaining(), 4);
    /// ```
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Number of bytes left between the cursor and the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a value of type `T` in big-endian format and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_be<T: ClassIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `len` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(out_of_bounds_error!());
        }

        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }
}
