//! Error taxonomy for backend calls.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 401.
    #[error("authentication failed")]
    Authentication,

    /// HTTP 429.
    #[error("too many requests, retry later")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The request never produced a response (connect, TLS, timeout...).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// A response arrived but did not have the expected shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    /// Rejected client-side before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 => ApiError::Authentication,
            429 => ApiError::RateLimited,
            code => ApiError::Http {
                status: code,
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_classification() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED),
            ApiError::Authentication
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS),
            ApiError::RateLimited
        ));
        match ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE) {
            ApiError::Http { status, reason } => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
