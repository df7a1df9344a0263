//! Upstream error types.

use tracing::warn;

use super::convert::ConversionError;

/// Longest body excerpt kept in an error.
const BODY_EXCERPT_CHARS: usize = 500;

/// Errors from talking to the traffic service.
///
/// Every client operation returns this type; there is no sentinel value or
/// silent empty result on failure.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with anything other than 200
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// Body did not have the expected shape
    #[error("parse error: {message}")]
    Parse {
        message: String,
        body: Option<String>,
    },

    /// No train matched the query at the requested index
    #[error("no train matching {query:?} at index {index}")]
    TrainNotFound { query: String, index: usize },

    /// The request limiter was closed
    #[error("request limiter closed")]
    LimiterClosed,
}

impl UpstreamError {
    /// A non-200 answer carrying an excerpt of its body.
    pub fn status(status: u16, body: &str) -> Self {
        UpstreamError::Status {
            status,
            body: excerpt(body),
        }
    }

    /// A parse failure carrying an excerpt of the offending body.
    pub fn parse(message: impl Into<String>, body: &str) -> Self {
        UpstreamError::Parse {
            message: message.into(),
            body: Some(excerpt(body)),
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

impl From<ConversionError> for UpstreamError {
    fn from(err: ConversionError) -> Self {
        UpstreamError::Parse {
            message: err.to_string(),
            body: None,
        }
    }
}

/// Best-effort view of a list result.
///
/// For callers that treat "nothing this time" and "failed this time" alike,
/// e.g. a poller that simply retries on its next tick.
pub trait OrEmpty<T> {
    /// The list on success; an empty list (after logging the error) otherwise.
    fn or_empty(self, operation: &str) -> Vec<T>;
}

impl<T> OrEmpty<T> for Result<Vec<T>, UpstreamError> {
    fn or_empty(self, operation: &str) -> Vec<T> {
        match self {
            Ok(items) => items,
            Err(e) => {
                warn!(operation, error = %e, "Upstream call failed, using empty result");
                Vec::new()
            }
        }
    }
}
