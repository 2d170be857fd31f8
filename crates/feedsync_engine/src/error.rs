//! Error types for the sync engine.
//!
//! Internally every operation raises a [`Fault`]. Operations that report
//! errors to their caller funnel the fault through one classifier
//! ([`AppError::classify`]) so callers only ever see three kinds.

use feedsync_protocol::{ApiResponse, ProtocolError};
use feedsync_store::StoreError;
use std::io;
use thiserror::Error;

/// Result type for caller-facing engine operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors reported to callers of the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The remote service could not be reached.
    #[error("network error: remote service unreachable")]
    Network,

    /// The remote service rejected the request.
    #[error("api error {code}: {message}")]
    Api {
        /// Status code of the response.
        code: u16,
        /// Status message of the response.
        message: String,
    },

    /// Any other failure.
    #[error("unknown error")]
    Unknown,
}

impl AppError {
    /// Builds an [`AppError::Api`] from a response's status.
    pub fn from_response<T>(response: &ApiResponse<T>) -> Self {
        Self::Api {
            code: response.code,
            message: response.message.clone(),
        }
    }

    /// Maps a raised fault onto one of the reportable kinds.
    ///
    /// - I/O faults are connectivity problems: [`AppError::Network`]
    /// - Already classified errors pass through unchanged
    /// - Everything else, local store failures included, is
    ///   [`AppError::Unknown`]
    pub fn classify(fault: Fault) -> Self {
        match fault {
            Fault::Io(_) => Self::Network,
            Fault::App(err) => err,
            Fault::Store(_) | Fault::Protocol(_) | Fault::Other(_) => Self::Unknown,
        }
    }

    /// Returns true if the caller may retry the operation as is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Network)
    }
}

impl From<Fault> for AppError {
    fn from(fault: Fault) -> Self {
        Self::classify(fault)
    }
}

/// Anything an engine operation or a remote can raise.
#[derive(Error, Debug)]
pub enum Fault {
    /// Connectivity or transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An already classified error.
    #[error(transparent)]
    App(#[from] AppError),

    /// Local store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Payload could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Uncategorized failure.
    #[error("{0}")]
    Other(String),
}

impl Fault {
    /// Creates an uncategorized fault.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_is_network() {
        let fault = Fault::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(AppError::classify(fault), AppError::Network);

        let fault = Fault::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert_eq!(AppError::from(fault), AppError::Network);
    }

    #[test]
    fn classified_passes_through() {
        let api = AppError::Api {
            code: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(AppError::classify(Fault::App(api.clone())), api);
        assert_eq!(AppError::classify(Fault::App(AppError::Network)), AppError::Network);
    }

    #[test]
    fn everything_else_is_unknown() {
        let store = Fault::from(StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk")));
        assert_eq!(AppError::classify(store), AppError::Unknown);

        let decode = Fault::from(ProtocolError::Decode("bad json".into()));
        assert_eq!(AppError::classify(decode), AppError::Unknown);

        assert_eq!(AppError::classify(Fault::other("boom")), AppError::Unknown);
    }

    #[test]
    fn api_error_from_response() {
        let response = ApiResponse::<()>::status(404, "Not Found");
        assert_eq!(
            AppError::from_response(&response),
            AppError::Api {
                code: 404,
                message: "Not Found".into()
            }
        );
    }

    #[test]
    fn retryable_errors() {
        assert!(AppError::Network.is_retryable());
        assert!(!AppError::Unknown.is_retryable());
        assert!(!AppError::Api {
            code: 503,
            message: "Service Unavailable".into()
        }
        .is_retryable());
    }

    #[test]
    fn error_display() {
        let err = AppError::Api {
            code: 400,
            message: "Bad Request".into(),
        };
        assert_eq!(err.to_string(), "api error 400: Bad Request");
        assert_eq!(AppError::Unknown.to_string(), "unknown error");
    }
}
