//! Error types for pdfstitch.
//!
//! Every fallible operation in the crate returns [`PdfStitchError`]. The
//! variants are split by how the merge engine reacts to them: recoverable
//! source errors are recorded in the merge report and the batch continues,
//! everything else aborts the operation.
//!
//! # Error Categories
//!
//! - **Source errors**: missing, unreadable, malformed or encrypted inputs
//! - **Image errors**: unknown formats and filter/payload mismatches
//! - **Output errors**: the destination cannot be created or written
//! - **Configuration errors**: invalid option combinations

use std::io;
use std::path::PathBuf;

use crate::object::ObjectNumber;

/// Result type alias for pdfstitch operations.
pub type Result<T> = std::result::Result<T, PdfStitchError>;

/// Main error type for pdfstitch operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfStitchError {
    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input path exists but is not a regular file.
    #[error("Not a file: {}", path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Input file exists but could not be read.
    #[error("Cannot read file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Source PDF lacks a recoverable trailer/Catalog/Pages/Kids chain.
    #[error("Malformed PDF: {}\n  Details: {details}", path.display())]
    MalformedSource {
        /// Path to the malformed PDF.
        path: PathBuf,
        /// What the structural reader could not find or parse.
        details: String,
    },

    /// Source PDF is encrypted.
    #[error(
        "PDF is encrypted and cannot be merged: {}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        path.display()
    )]
    EncryptedSource {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// Image bytes are not PNG or JPEG, or use a variant that cannot be embedded.
    #[error("Unsupported image: {}\n  Reason: {reason}", path.display())]
    UnsupportedImageFormat {
        /// Path to the image.
        path: PathBuf,
        /// Why the image was rejected.
        reason: String,
    },

    /// An image XObject was requested with a filter that does not match its payload.
    #[error("Image filter {filter} does not match payload: {reason}")]
    FilterMismatch {
        /// Name of the requested filter.
        filter: String,
        /// What is wrong with the payload.
        reason: String,
    },

    /// An object number was looked up that was never registered.
    #[error("Object {number} is not registered")]
    ObjectNotFound {
        /// The unknown object number.
        number: ObjectNumber,
    },

    /// The output file could not be created or written.
    #[error("Failed to write output file: {}\n  Reason: {source}", path.display())]
    WriteFailure {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// No files were provided for merging.
    #[error("No input files specified for merging")]
    NoFilesToMerge,

    /// Every merge input was skipped.
    #[error("None of the {skipped} input file(s) could be merged")]
    NoInputsSucceeded {
        /// Number of skipped inputs.
        skipped: usize,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for PdfStitchError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(err.to_string())
    }
}

impl PdfStitchError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a MalformedSource error.
    pub fn malformed_source(path: PathBuf, details: impl Into<String>) -> Self {
        Self::MalformedSource {
            path,
            details: details.into(),
        }
    }

    /// Create an UnsupportedImageFormat error.
    pub fn unsupported_image(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::UnsupportedImageFormat {
            path,
            reason: reason.into(),
        }
    }

    /// Create a FilterMismatch error.
    pub fn filter_mismatch(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilterMismatch {
            filter: filter.into(),
            reason: reason.into(),
        }
    }

    /// Create a WriteFailure error.
    pub fn write_failure(path: PathBuf, source: io::Error) -> Self {
        Self::WriteFailure { path, source }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if a merge can skip the offending source and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::NotAFile { .. }
                | Self::FileNotAccessible { .. }
                | Self::MalformedSource { .. }
                | Self::EncryptedSource { .. }
        )
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::MalformedSource { .. } => 3,
            Self::EncryptedSource { .. } => 3,
            Self::UnsupportedImageFormat { .. } => 3,
            Self::FilterMismatch { .. } => 6,
            Self::ObjectNotFound { .. } => 6,
            Self::WriteFailure { .. } => 5,
            Self::OutputExists { .. } => 4,
            Self::NoFilesToMerge => 1,
            Self::NoInputsSucceeded { .. } => 3,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130,
            Self::Io(_) => 5,
            Self::Other { .. } => 1,
        }
    }
}
