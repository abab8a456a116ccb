//! Error types for the XNB loader.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for content loading operations.
///
/// Every failure here is fatal for the decode in progress. The loader never
/// recovers into a partial asset; callers retry by reopening the stream.
#[derive(Error, Debug)]
pub enum Error {
    /// Content file does not exist or cannot be accessed
    #[error("Content file not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at start of file
    #[error("Invalid XNB file: expected XNB magic bytes")]
    InvalidMagic,

    /// Unsupported container format version
    #[error("Unsupported XNB format version: {0}")]
    UnsupportedVersion(u8),

    /// Unknown target platform byte in the container header
    #[error("Unknown XNB target platform: {0:#04x}")]
    UnsupportedPlatform(u8),

    /// Compressed payloads belong to the pipeline side, not the runtime loader
    #[error("Compressed XNB content is not supported")]
    CompressedContent,

    /// Manifest names a reader this build does not know
    #[error("Unknown type reader: {0}")]
    UnknownTypeReader(String),

    /// Object payload carries a type index outside the reader table
    #[error("Incorrect type reader index: {index} (table has {count} readers)")]
    InvalidTypeReaderIndex { index: usize, count: usize },

    /// A shared resource resolved to a different type than the fixup expects
    #[error("Error loading shared resource. Expected type {expected}, received type {actual}")]
    SharedResourceTypeMismatch { expected: String, actual: String },

    /// Type mismatch when converting a decoded value
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Requested operation has no supporting reader in the stream table
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for content loading operations.
pub type Result<T> = std::result::Result<T, Error>;
