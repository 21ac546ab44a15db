//! Error and Result types.

use std::io;

/// A specialized `Result` type for unisql.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A generic error that represents all the ways an operation can fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error communicating with the database over the network.
    #[error("error communicating with the server: {0}")]
    Io(#[from] io::Error),

    /// An error occurred while negotiating or running TLS.
    #[error("error during TLS upgrade: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server rejected our credentials or asked for an unsupported
    /// authentication method.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Unexpected or invalid data was encountered: malformed framing, an
    /// unknown token, or a message that is not legal in the current state.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(String),

    /// An error was returned by the database engine itself.
    #[error("{0}")]
    Server(#[source] ServerError),

    /// An operation was attempted on a closed connection or pool.
    #[error("attempted to communicate with a closed connection or pool")]
    ConnectionClosed,

    /// Column was not found by name in a row.
    #[error("no column found with the name {0:?}")]
    ColumnNotFound(String),

    /// A value could not be converted to the requested type.
    #[error("mismatched types: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// The query or connection exceeded its deadline. The connection is no
    /// longer usable and will be evicted by any pool that owns it.
    #[error("operation timed out")]
    Timeout,

    /// A documented gap in protocol support.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Connection options could not be parsed.
    #[error("error with configuration: {0}")]
    Configuration(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn config(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Configuration(err.into())
    }

    pub(crate) fn tls(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Tls(err.into())
    }

    /// Returns the engine-signalled error, if this is [`Error::Server`].
    pub fn as_server_error(&self) -> Option<&ServerError> {
        match self {
            Error::Server(err) => Some(err),
            _ => None,
        }
    }
}

/// An error reported by the database engine in its response stream:
/// a TDS `ERROR` token (0xAA), a PostgreSQL `ErrorResponse`, or a MySQL
/// `ERR` packet.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServerError {
    /// Engine error number (0 where the engine reports none).
    pub code: i64,

    /// The primary, human-readable error message.
    pub message: String,

    /// SQLSTATE (or the engine's state byte) where the engine provides one.
    pub state: Option<String>,
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Configuration(err.into())
    }
}

// lazily formats a protocol error; used pervasively by the decoders
macro_rules! err_protocol {
    ($($args:tt)*) => {
        $crate::error::Error::Protocol(format!($($args)*))
    };
}
