//! Batch processing of a class directory.
//!
//! A [`crate::batch::Batch`] discovers every `.class` file below the configured class
//! directory, runs each through [`crate::batch::processor::process`] on a rayon pool, and
//! collects a [`crate::batch::BatchReport`].
//!
//! # Architecture
//!
//! The run has three phases:
//!
//! 1. **Discovery** - `walkdir` lists the class files, sorted so reports are stable. An
//!    output directory nested inside the class directory is not descended into.
//! 2. **Processing** - artifacts are independent and processed in parallel. The only shared
//!    state is the [`crate::batch::BatchContext`]. The first batch-fatal error stops the
//!    run and is returned.
//! 3. **Release** - when `keep_original` is off, inputs of published artifacts are deleted.
//!    This happens only after every artifact succeeded, so supertype lookups during
//!    processing always see the complete class directory, and a failed batch never deletes
//!    anything.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use serialver::{Batch, Config};
//!
//! let config = Config::new("target/classes")
//!     .keep_original(true)
//!     .overwrite(false);
//!
//! let report = Batch::new(config)?.run()?;
//! println!("{}", report);
//! # Ok::<(), serialver::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Workers share the context by reference. Each worker owns its file handles and output
//! files, which are released on every exit path.

mod config;
mod context;
pub mod output;
pub mod processor;
mod result;

pub use config::{Config, DEFAULT_OUTPUT_DIR};
pub use context::BatchContext;
pub use processor::{ArtifactReport, Outcome};
pub use result::BatchReport;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::{Error, Result};

/// A configured batch run over one class directory.
pub struct Batch {
    context: BatchContext,
}

impl Batch {
    /// Validates `config` and prepares a batch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Batch {
            context: BatchContext::new(config),
        })
    }

    /// The configuration this batch runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.context.config
    }

    /// Lists the class files below the class directory, relative to it and sorted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the directory tree cannot be read.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let config = &self.context.config;
        let output_dir = config.output_dir.canonicalize().ok();

        let mut found = Vec::new();
        let walker = WalkDir::new(&config.class_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| match &output_dir {
                Some(output_dir) if entry.file_type().is_dir() => entry
                    .path()
                    .canonicalize()
                    .map_or(true, |path| path != *output_dir),
                _ => true,
            });

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().is_some_and(|ext| ext == "class") {
                if let Ok(relative) = entry.path().strip_prefix(&config.class_dir) {
                    found.push(relative.to_path_buf());
                }
            }
        }

        found.sort();
        Ok(found)
    }

    /// Runs the batch.
    ///
    /// # Errors
    ///
    /// Returns the first batch-fatal error: I/O failures, invariant violations, an invalid
    /// thread pool, or malformed input in strict mode.
    pub fn run(&self) -> Result<BatchReport> {
        let artifacts = self.discover()?;
        log::debug!(
            "Processing {} class files under {}",
            artifacts.len(),
            self.context.config.class_dir.display()
        );

        let reports = match self.context.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Configuration(format!("Cannot build thread pool: {e}")))?;
                pool.install(|| self.process_all(&artifacts))?
            }
            None => self.process_all(&artifacts)?,
        };

        let mut report = BatchReport::new(reports);
        if !self.context.config.keep_original {
            report.removed = self.release(&report)?;
        }

        log::info!("{}", report);
        Ok(report)
    }

    fn process_all(&self, artifacts: &[PathBuf]) -> Result<Vec<ArtifactReport>> {
        artifacts
            .par_iter()
            .map(|relative| processor::process(&self.context, relative))
            .collect()
    }

    fn release(&self, report: &BatchReport) -> Result<Vec<PathBuf>> {
        let class_dir = &self.context.config.class_dir;
        let mut removed = Vec::new();

        for artifact in report
            .artifacts
            .iter()
            .filter(|artifact| artifact.outcome.is_published())
        {
            let input = class_dir.join(&artifact.path);
            log::debug!("Removing class file: '{}'", artifact.path.display());
            remove_if_exists(&input)?;
            removed.push(artifact.path.clone());
        }

        Ok(removed)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(Error::FileError(error)),
    }
}
