//! Error types for bionic-epub.
//!
//! All fallible operations return [`BionicError`] through the crate-wide
//! [`Result`] alias. A run is aborted on the first error; the variant tells
//! the user which stage failed.
//!
//! # Examples
//!
//! ```
//! use bionic_epub::error::{BionicError, Result};
//!
//! fn load() -> Result<()> {
//!     Err(BionicError::input("EPUB file does not exist: book.epub"))
//! }
//!
//! match load() {
//!     Ok(_) => println!("loaded"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for bionic-epub operations.
#[derive(Error, Debug)]
pub enum BionicError {
    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing or invalid input file, or a missing custom stylesheet.
    #[error("Input error: {0}")]
    Input(String),

    /// The analyzer is unavailable or failed on a unit of text.
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// The rewriter could not reconcile a fragment with its source node.
    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Zip container errors.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The finished output could not be moved into place.
    #[error("Persist error: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// Malformed container.xml, OPF package or content document.
    #[error("Package error: {0}")]
    Package(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with BionicError.
pub type Result<T> = std::result::Result<T, BionicError>;

impl BionicError {
    /// Create a new input error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        BionicError::Input(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        BionicError::Analysis(msg.into())
    }

    /// Create a new structural mismatch error.
    pub fn structural_mismatch<S: Into<String>>(msg: S) -> Self {
        BionicError::StructuralMismatch(msg.into())
    }

    /// Create a new package error.
    pub fn package<S: Into<String>>(msg: S) -> Self {
        BionicError::Package(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        BionicError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        BionicError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        BionicError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether this error belongs to the analysis stage.
    pub fn is_analysis(&self) -> bool {
        matches!(self, BionicError::Analysis(_))
    }

    /// Whether this error was raised while rewriting a document tree.
    pub fn is_structural_mismatch(&self) -> bool {
        matches!(self, BionicError::StructuralMismatch(_))
    }
}
