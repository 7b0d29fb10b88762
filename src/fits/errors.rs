//! Custom error types for FITS cutout processing

use std::fmt;
use std::io;

/// Errors raised while parsing, reading, cutting or writing FITS data
#[derive(Debug)]
pub enum FitsError {
    /// I/O error
    IoError(io::Error),
    /// Malformed cutout specification
    Parse {
        /// The offending token (or the whole specification)
        token: String,
        /// What is wrong with it
        reason: String,
    },
    /// Request rank or position does not fit the source array
    InvalidShape(String),
    /// The requested region does not intersect the array
    NoOverlap,
    /// The requested region does not intersect the targeted HDU
    NoContent(String),
    /// Feature or data type this crate does not handle
    Unsupported(String),
    /// Header is missing a mandatory keyword or holds a bad value
    InvalidHeader(String),
    /// Stream ended in the middle of a header or data unit
    UnexpectedEof,
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for FitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitsError::IoError(e) => write!(f, "I/O error: {}", e),
            FitsError::Parse { token, reason } => {
                write!(f, "Invalid cutout specification at '{}': {}", token, reason)
            }
            FitsError::InvalidShape(msg) => write!(f, "Invalid shape requested: {}", msg),
            FitsError::NoOverlap => write!(f, "Arrays do not overlap"),
            FitsError::NoContent(msg) => write!(f, "No content: {}", msg),
            FitsError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            FitsError::InvalidHeader(msg) => write!(f, "Invalid FITS header: {}", msg),
            FitsError::UnexpectedEof => write!(f, "Unexpected end of FITS stream"),
            FitsError::GenericError(msg) => write!(f, "FITS error: {}", msg),
        }
    }
}

impl std::error::Error for FitsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FitsError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FitsError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            FitsError::UnexpectedEof
        } else {
            FitsError::IoError(error)
        }
    }
}

impl From<String> for FitsError {
    fn from(msg: String) -> Self {
        FitsError::GenericError(msg)
    }
}

impl FitsError {
    /// Build a parse error for the given token
    pub fn parse(token: &str, reason: &str) -> Self {
        FitsError::Parse {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for FITS operations
pub type FitsResult<T> = Result<T, FitsError>;
