//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for class files on disk. The file is mapped read-only into
//! the address space, so a batch over thousands of small class files never copies their
//! content into owned buffers before parsing.
//!
//! # Integration
//!
//! This module integrates with:
//! - [`crate::file`] - Provides the [`crate::file::Backend`] trait implementation
//! - [`crate::file::File`] - Uses the physical backend for path-based loading
//! - [`crate::batch`] - Reads every discovered artifact through this backend

use super::Backend;
use crate::{
    Error::{Empty, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for read-only access to files on disk.
///
/// Zero-length files are rejected up front, since an empty mapping cannot be created portably
/// and an empty class file is never valid.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file to be memory-mapped
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and
    /// [`crate::Error::Empty`] if the file has no content.
    pub fn new(path: &Path) -> Result<Physical> {
        let file = fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Empty);
        }

        // SAFETY: the mapping is read-only and lives as long as this backend. Concurrent
        // truncation by another process is outside what a build step guards against.
        let mmap = unsafe { Mmap::map(&file) }.map_err(FileError)?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn physical_reads_mapped_content() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x3D])
            .unwrap();
        temp.flush().unwrap();

        let physical = Physical::new(temp.path()).unwrap();
        assert_eq!(physical.len(), 8);
        assert_eq!(&physical.data()[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(physical.data()[7], 0x3D);
    }

    #[test]
    fn physical_rejects_empty_file() {
        let temp = NamedTempFile::new().unwrap();
        assert!(matches!(Physical::new(temp.path()), Err(Empty)));
    }

    #[test]
    fn physical_missing_file() {
        let result = Physical::new(Path::new("/nonexistent/path/Missing.class"));
        assert!(matches!(result, Err(FileError(_))));
    }
}
