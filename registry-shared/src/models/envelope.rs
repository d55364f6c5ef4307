use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Pagination echo attached to some responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaPagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

/// Response metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub pagination: Option<MetaPagination>,
}

/// Validation detail: the API sends either one string or a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetails {
    One(String),
    Many(Vec<String>),
}

/// Uniform response envelope used by every endpoint except login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
    #[serde(default)]
    pub errors: Option<ErrorDetails>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload of a successful response.
    ///
    /// # Errors
    /// Returns a [`Rejection`] carrying the server's message, or `fallback`
    /// when the server sent none, if the response is unsuccessful or empty.
    pub fn into_data(self, fallback: &str) -> Result<T, Rejection> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(Rejection::new(self.message, fallback)),
        }
    }

    /// Accept a successful response regardless of its payload.
    ///
    /// # Errors
    /// Returns a [`Rejection`] if the server reported failure.
    pub fn into_ack(self, fallback: &str) -> Result<(), Rejection> {
        if self.success {
            Ok(())
        } else {
            Err(Rejection::new(self.message, fallback))
        }
    }
}

/// A request the server refused, with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
}

impl Rejection {
    /// Use `message` when present and non-blank, otherwise `fallback`.
    #[must_use]
    pub fn new(message: Option<String>, fallback: &str) -> Self {
        let message = message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self { message }
    }

    /// Pull `message` out of an arbitrary JSON error body.
    #[must_use]
    pub fn from_body(body: &serde_json::Value, fallback: &str) -> Self {
        let message = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        Self::new(message, fallback)
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Rejection {}
