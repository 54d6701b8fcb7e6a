use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

macro_rules! invariant_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvariantViolation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvariantViolation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into two groups with different consequences for a batch run:
///
/// ## Per-artifact errors
/// - [`Error::Malformed`] - Corrupted or invalid class file structure
/// - [`Error::OutOfBounds`] - Truncated input, a read ran past the end of the data
/// - [`Error::NotSupported`] - Class file version outside the supported range
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FieldNotFound`] - A replace or remove targeted a field that does not exist
///
/// A batch records the first three as a parse error for the artifact and moves on
/// (see [`Error::is_malformed`]).
///
/// ## Batch-fatal errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::WriteFailed`] - Atomic publish of a patched class file failed
/// - [`Error::InvariantViolation`] - An internal consistency check failed while patching
/// - [`Error::Configuration`] - The batch configuration is unusable
///
/// # Examples
///
/// ```rust
/// use serialver::{ClassFile, Error};
///
/// match ClassFile::parse(&[0xCA, 0xFE]) {
///     Ok(_) => println!("parsed"),
///     Err(e) if e.is_malformed() => println!("skipping malformed input: {}", e),
///     Err(e) => println!("hard failure: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The class file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The class file uses a major version this library does not understand.
    #[error("Unsupported class file version {0}")]
    NotSupported(u16),

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// A field addressed by name does not exist in the field table.
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// An internal invariant of the container model was violated.
    ///
    /// Indicates a bug or a request the container cannot represent (for example a
    /// constant pool that would exceed 65535 slots), never plain malformed input.
    #[error("Invariant violated - {file}:{line}: {message}")]
    InvariantViolation {
        /// Description of the violated invariant
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Writing or publishing an output file failed.
    #[error("Failed to write output: {message}")]
    WriteFailed {
        /// Details about the failed step
        message: String,
    },

    /// The batch configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns `true` for errors that describe unparsable input rather than a failure of
    /// the environment or of this library.
    ///
    /// These are the errors a batch downgrades to a per-artifact parse error.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Malformed { .. } | Error::OutOfBounds | Error::NotSupported(_) | Error::Empty
        )
    }
}
