//! Unified error type.

use std::fmt;

/// A boxed, thread-safe error as returned by a failing handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by plait's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed by writing to the
/// [`Response`](crate::Response), not as `Error`s. This type surfaces
/// infrastructure failures and handlers that bailed out of a dispatch.
#[derive(Debug)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    Io(std::io::Error),
    /// The bind address is not a valid `host:port`.
    Addr(std::net::AddrParseError),
    /// A header name or value is not valid HTTP.
    Header(http::Error),
    /// The handler at position `index` in the chain returned an error.
    Handler { index: usize, source: BoxError },
}

impl Error {
    /// Position of the failing handler, if this error came out of a dispatch.
    pub fn handler_index(&self) -> Option<usize> {
        match self {
            Self::Handler { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)                     => write!(f, "io: {e}"),
            Self::Addr(e)                   => write!(f, "invalid socket address: {e}"),
            Self::Header(e)                 => write!(f, "invalid header: {e}"),
            Self::Handler { index, source } => write!(f, "handler #{index} failed: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e)                  => Some(e),
            Self::Addr(e)                => Some(e),
            Self::Header(e)              => Some(e),
            Self::Handler { source, .. } => Some(&**source),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<std::net::AddrParseError> for Error {
    fn from(e: std::net::AddrParseError) -> Self {
        Self::Addr(e)
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Self::Header(e)
    }
}
