//! Error types for gblur-server
//!
//! Every variant is local to one connection: the handler logs it and closes
//! the socket without sending a reply.

use thiserror::Error;

/// Main error type for gblur-server
#[derive(Error, Debug)]
pub enum Error {
    /// Truncated or malformed control header
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Header parsed but its parameters cannot be served
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unsupported or corrupt image payload
    #[error("Image decode error: {0}")]
    Decode(String),

    /// Failure serializing the blurred image
    #[error("Image encode error: {0}")]
    Encode(String),

    /// Peer reset, premature close, or failed write
    #[error("Connection error: {0}")]
    Connection(String),

    /// A convolution worker faulted; the whole job is discarded
    #[error("Worker error: {0}")]
    Worker(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File or socket I/O errors outside a connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the failure was caused by what the peer sent or did
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Error::Protocol(_) | Error::InvalidRequest(_) | Error::Decode(_) | Error::Connection(_)
        )
    }
}

impl From<gblur_common::Error> for Error {
    fn from(err: gblur_common::Error) -> Self {
        match err {
            gblur_common::Error::Protocol(msg) => Error::Protocol(msg),
            gblur_common::Error::Io(e) => Error::Connection(e.to_string()),
            gblur_common::Error::Config(msg) => Error::Config(msg),
            gblur_common::Error::InvalidInput(msg) => Error::InvalidRequest(msg),
        }
    }
}

/// Convenience Result type using gblur-server Error
pub type Result<T> = std::result::Result<T, Error>;
