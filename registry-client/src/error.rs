use shared::models::Rejection;
use thiserror::Error;

use crate::storage::StorageError;

/// Shown when the server cannot be reached at all.
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to connect to the server. Make sure your internet connection is stable.";
/// Shown when the login call exceeds its timeout.
pub const LOGIN_TIMEOUT_MESSAGE: &str =
    "Login timeout. The server took too long to respond.";
/// Shown when any other call exceeds its timeout.
pub const REQUEST_TIMEOUT_MESSAGE: &str =
    "Request timeout. The server took too long to respond.";

/// Normalized failure of a call through the API gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity,
    #[error("{0}")]
    Timeout(&'static str),
    /// The server answered but refused: non-2xx status or `success: false`.
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },
    #[error("unexpected response from server: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    Request(String),
}

impl GatewayError {
    /// `true` for an HTTP 401 answer.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: Some(401), .. })
    }
}

impl From<Rejection> for GatewayError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected {
            status: None,
            message: rejection.message,
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        Self::Request(format!("invalid endpoint: {err}"))
    }
}

/// Failure of a session operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("email and password are required")]
    MissingCredentials,
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("no refresh token is available")]
    MissingRefreshToken,
}
