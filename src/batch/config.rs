//! Batch configuration.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Name of the default output directory, created next to the class directory.
pub const DEFAULT_OUTPUT_DIR: &str = "processed-classes";

/// Settings for one batch run.
///
/// Built with a builder-style API and checked by [`Config::validate`] before any file is
/// touched.
///
/// # Examples
///
/// ```rust
/// use serialver::Config;
///
/// let config = Config::new("target/classes")
///     .overwrite(true)
///     .keep_original(true)
///     .threads(4);
///
/// assert_eq!(config.output_dir, std::path::Path::new("target/processed-classes"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Root directory of the compiled classes
    pub class_dir: PathBuf,
    /// Where published class files are written, mirroring the layout under `class_dir`
    pub output_dir: PathBuf,
    /// Keep the input files instead of deleting them after publishing
    pub keep_original: bool,
    /// Replace a conflicting existing `serialVersionUID` instead of warning
    pub overwrite: bool,
    /// Abort the batch on the first unparsable class file
    pub strict: bool,
    /// Extra class directories consulted when resolving supertypes
    pub classpath: Vec<PathBuf>,
    /// Worker threads, `None` for the global pool
    pub threads: Option<usize>,
}

impl Config {
    /// Creates a configuration for `class_dir` with every option at its default.
    ///
    /// The output directory defaults to `processed-classes` beside `class_dir`.
    #[must_use]
    pub fn new<P: AsRef<Path>>(class_dir: P) -> Self {
        let class_dir = class_dir.as_ref().to_path_buf();
        let output_dir = class_dir.parent().map_or_else(
            || PathBuf::from(DEFAULT_OUTPUT_DIR),
            |parent| parent.join(DEFAULT_OUTPUT_DIR),
        );

        Config {
            class_dir,
            output_dir,
            keep_original: false,
            overwrite: false,
            strict: false,
            classpath: Vec::new(),
            threads: None,
        }
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    /// Keep or delete input files after they have been published.
    #[must_use]
    pub fn keep_original(mut self, keep: bool) -> Self {
        self.keep_original = keep;
        self
    }

    /// Replace conflicting fingerprints instead of warning about them.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Treat unparsable class files as fatal.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Adds a directory to search for supertypes that are not in `class_dir`.
    #[must_use]
    pub fn with_classpath<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.classpath.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Checks that the configuration can be run.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Configuration`] if `class_dir` or a classpath entry is not a
    /// directory, the thread count is zero, or the output directory is the class directory.
    pub fn validate(&self) -> Result<()> {
        if !self.class_dir.is_dir() {
            return Err(Error::Configuration(format!(
                "Class directory does not exist or is not a directory: {}",
                self.class_dir.display()
            )));
        }

        for entry in &self.classpath {
            if !entry.is_dir() {
                return Err(Error::Configuration(format!(
                    "Classpath entry does not exist or is not a directory: {}",
                    entry.display()
                )));
            }
        }

        if self.threads == Some(0) {
            return Err(Error::Configuration(
                "Thread count must be at least 1".to_string(),
            ));
        }

        let same_dir = match (self.class_dir.canonicalize(), self.output_dir.canonicalize()) {
            (Ok(class_dir), Ok(output_dir)) => class_dir == output_dir,
            _ => self.class_dir == self.output_dir,
        };
        if same_dir {
            return Err(Error::Configuration(format!(
                "Output directory must differ from the class directory: {}",
                self.output_dir.display()
            )));
        }

        Ok(())
    }
}
