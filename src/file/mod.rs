//! Raw input access for class files.
//!
//! This module abstracts where class file bytes come from. A [`crate::file::File`] owns a
//! [`crate::file::Backend`], a read-only memory mapping of the file on disk. Parsing
//! is layered on top through [`crate::file::parser::Parser`] and the big-endian helpers in
//! [`crate::file::io`].
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Loaded class file bytes with an optional source path
//! - [`crate::file::Backend`] - Trait implemented by the storage backends
//! - [`crate::file::parser::Parser`] - Bounds-checked cursor used by the class file reader
//! - [`crate::file::io`] - Big-endian read and write primitives
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use serialver::{ClassFile, File};
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("target/classes/com/example/Plain.class"))?;
//! let class = ClassFile::parse(file.data())?;
//! println!("{} ({} bytes)", class.class_name()?, file.len());
//! # Ok::<(), serialver::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`crate::file::File`] is [`Send`] and [`Sync`]; the batch runner loads one per artifact on
//! whichever worker picks that artifact up.

pub mod io;
pub mod parser;

mod physical;

use std::path::{Path, PathBuf};

use crate::Result;
use physical::Physical;

/// Backend trait for reading the bytes of a class file.
///
/// The trait is object safe so [`crate::file::File`] holds its backend behind a box.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data.
    fn len(&self) -> usize;
}

/// The raw bytes of one class file loaded from disk.
pub struct File {
    data: Box<dyn Backend>,
    path: PathBuf,
}

impl File {
    /// Loads a class file from disk using memory-mapped I/O.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the class file on disk
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be read and
    /// [`crate::Error::Empty`] if it has no content.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Ok(File {
            data: Box::new(input),
            path: file.to_path_buf(),
        })
    }

    /// Returns the total size of the loaded data in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no data is loaded. Never true for a successfully constructed file.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns the entire raw data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// The path this file was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn from_file_sample() {
        let path = crate::test::sample_path("Plain");
        let file = File::from_file(&path).unwrap();
        assert_eq!(file.path(), path.as_path());
        assert!(!file.is_empty());
        assert_eq!(file.len(), crate::test::sample_bytes("Plain").len());
        assert_eq!(&file.data()[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    }

    #[test]
    fn from_file_missing() {
        let result = File::from_file(Path::new("/nonexistent/path/Missing.class"));
        assert!(matches!(result, Err(Error::FileError(_))));
    }
}
