//! Atomic publication of class files.
//!
//! This module provides [`crate::batch::output::Output`], a memory-mapped file that is
//! written under a temporary sibling name and renamed onto its target only when
//! [`crate::batch::output::Output::finalize`] succeeds. A reader of the output directory
//! therefore sees either the previous file or the complete new one, never a prefix.
//! Dropping an unfinalized `Output` deletes the temporary file.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use memmap2::{MmapMut, MmapOptions};

use crate::{Error, Result};

/// A memory-mapped output file that is published atomically.
///
/// Files are written to a temporary location in the same directory as the target so
/// that the final rename never crosses a filesystem boundary.
pub struct Output {
    /// The memory mapping of the temporary file
    mmap: MmapMut,

    /// Where the data is written until finalization
    temp_path: PathBuf,

    /// Where the data is published
    target_path: PathBuf,

    /// Whether the file has been renamed into place
    finalized: bool,
}

impl Output {
    /// Creates a temporary file of `size` bytes next to `target_path` and maps it.
    ///
    /// Missing parent directories of the target are created.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if the directory, file or mapping cannot be
    /// created, or if `size` is zero.
    pub fn create<P: AsRef<Path>>(target_path: P, size: u64) -> Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();
        if size == 0 {
            return Err(Error::WriteFailed {
                message: format!("Refusing to publish empty file {}", target_path.display()),
            });
        }

        let Some(file_name) = target_path.file_name() else {
            return Err(Error::WriteFailed {
                message: format!("Target {} has no file name", target_path.display()),
            });
        };

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::WriteFailed {
                message: format!("Failed to create directory {}: {e}", parent.display()),
            })?;
        }

        let mut temp_name = OsString::from(".");
        temp_name.push(file_name);
        temp_name.push(format!(".{}.tmp", std::process::id()));
        let temp_path = target_path.with_file_name(temp_name);

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::WriteFailed {
                message: format!("Failed to create {}: {e}", temp_path.display()),
            })?;

        let mapped = file
            .set_len(size)
            .map_err(|e| format!("Failed to set file size: {e}"))
            .and_then(|()| {
                // SAFETY: the temporary file is private to this Output until it is renamed
                unsafe { MmapOptions::new().map_mut(&file) }
                    .map_err(|e| format!("Failed to create memory mapping: {e}"))
            });

        match mapped {
            Ok(mmap) => Ok(Self {
                mmap,
                temp_path,
                target_path,
                finalized: false,
            }),
            Err(message) => {
                let _ = fs::remove_file(&temp_path);
                Err(Error::WriteFailed { message })
            }
        }
    }

    /// Writes `data` to a fresh file at `target_path` and publishes it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if any step fails; no partial file is left.
    pub fn publish<P: AsRef<Path>>(target_path: P, data: &[u8]) -> Result<()> {
        let mut output = Output::create(target_path, data.len() as u64)?;
        output.write_at(0, data)?;
        output.finalize()
    }

    /// Writes data at a specific offset in the file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if the write would exceed the file size.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let Some(end) = start.checked_add(data.len()) else {
            return Err(self.bounds_error(offset, data.len()));
        };
        if end > self.mmap.len() {
            return Err(self.bounds_error(offset, data.len()));
        }

        self.mmap[start..end].copy_from_slice(data);
        Ok(())
    }

    fn bounds_error(&self, offset: u64, len: usize) -> Error {
        Error::WriteFailed {
            message: format!(
                "Write would exceed file size: offset={}, len={}, file_size={}",
                offset,
                len,
                self.mmap.len()
            ),
        }
    }

    /// Gets the total size of the file.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Flushes pending writes of the mapping to the temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.mmap.flush().map_err(|e| Error::WriteFailed {
            message: format!("Failed to flush memory mapping: {e}"),
        })
    }

    /// Flushes the data and renames the temporary file onto the target.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::WriteFailed`] if flushing or renaming fails. The temporary
    /// file is removed in that case.
    pub fn finalize(mut self) -> Result<()> {
        self.flush()?;

        fs::rename(&self.temp_path, &self.target_path).map_err(|e| Error::WriteFailed {
            message: format!(
                "Failed to move {} to {}: {e}",
                self.temp_path.display(),
                self.target_path.display()
            ),
        })?;

        self.finalized = true;
        Ok(())
    }

    /// The destination of this file.
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if !self.finalized {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn publish_creates_parents() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("com/example/Plain.class");

        Output::publish(&target, &[0xCA, 0xFE, 0xBA, 0xBE]).unwrap();

        assert_eq!(fs::read(&target).unwrap(), [0xCA, 0xFE, 0xBA, 0xBE]);
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![OsString::from("Plain.class")]);
    }

    #[test]
    fn publish_replaces_existing() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("A.class");
        fs::write(&target, b"old content").unwrap();

        Output::publish(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn drop_without_finalize_cleans_up() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("B.class");

        {
            let mut output = Output::create(&target, 8).unwrap();
            output.write_at(0, b"partial").unwrap();
            assert_eq!(output.size(), 8);
            assert_eq!(output.target_path(), target.as_path());
        }

        assert!(!target.exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn bounds_checking() {
        let temp_dir = tempdir().unwrap();
        let mut output = Output::create(temp_dir.path().join("C.class"), 4).unwrap();

        assert!(output.write_at(2, b"abc").is_err());
        assert!(output.write_at(u64::MAX, b"a").is_err());
        assert!(output.write_at(0, b"abcd").is_ok());
    }

    #[test]
    fn empty_is_rejected() {
        let temp_dir = tempdir().unwrap();
        assert!(matches!(
            Output::create(temp_dir.path().join("D.class"), 0),
            Err(Error::WriteFailed { .. })
        ));
    }
}
