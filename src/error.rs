//! Crate-wide error type.
//!
//! Every fallible operation in the HDU layer returns one of the kinds below. Card-store
//! lookups that are missing a default, a dispatcher that cannot settle on a variant, a
//! truncated header, a malformed `TFORM`, and a verify-time shape mismatch are each
//! distinguishable by the caller; everything else funnels through `StreamError`.

use alloc::string::String;

/// All errors that can occur while dispatching, verifying, constructing, or coding a FITS HDU.
#[derive(Debug)]
pub enum Error {
    /// A card-store lookup by keyword found no match and no default was supplied.
    KeyNotFound(String),
    /// The HDU variant dispatcher could not determine a variant from the given inputs.
    UnknownHDU,
    /// End of stream was reached before an END card terminated the header.
    HeaderTruncated,
    /// A binary-table field descriptor (`TFORM`) did not match the grammar, or named an
    /// unknown type code. Carries the 1-based column index and a short reason.
    MalformedField(usize, String),
    /// A verify-time geometry mismatch that could not be auto-repaired (the mandatory
    /// keyword needed to compare against was altogether absent, not merely wrong).
    ShapeMismatch(String, String),
    /// An error forwarded from the underlying byte stream.
    #[cfg(feature = "std")]
    StreamError(std::io::Error),
    /// An error forwarded from the underlying byte stream, without `std`.
    #[cfg(not(feature = "std"))]
    StreamError(crate::io::IoError),
}

impl Error {
    /// Build the `StreamError` a reader/writer hits when the underlying stream or
    /// in-memory buffer ends before the requested number of bytes were available.
    #[cfg(feature = "std")]
    pub(crate) fn stream_truncated() -> Error {
        Error::StreamError(std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
    }

    #[cfg(not(feature = "std"))]
    pub(crate) fn stream_truncated() -> Error {
        Error::StreamError(crate::io::IoError::UnexpectedEof)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::KeyNotFound(key) => write!(f, "key not found: {key}"),
            Error::UnknownHDU => write!(f, "could not determine HDU variant"),
            Error::HeaderTruncated => write!(f, "header truncated before END card"),
            Error::MalformedField(col, reason) => {
                write!(f, "malformed field descriptor at column {col}: {reason}")
            }
            Error::ShapeMismatch(expected, actual) => {
                write!(f, "shape mismatch: expected {expected}, found {actual}")
            }
            Error::StreamError(e) => write!(f, "stream error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StreamError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StreamError(e)
    }
}

#[cfg(not(feature = "std"))]
impl From<crate::io::IoError> for Error {
    fn from(e: crate::io::IoError) -> Self {
        Error::StreamError(e)
    }
}
