use reqwest::StatusCode;
use thiserror::Error;

pub type CloudResult<T> = std::result::Result<T, CloudError>;

/// Closed set of remote-operation failures.
///
/// The original workflow collapsed every remote failure into a printed
/// string; here each call site gets a typed result and the caller decides
/// what (if anything) to do about it.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// Throttling or a server-side fault; retrying may succeed.
    #[error("transient service error ({status}): {message}")]
    Transient { status: u16, message: String },

    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("credentials not configured: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CloudError {
    /// Classify a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            404 => Self::NotFound(message),
            409 => Self::AlreadyExists(message),
            401 | 403 => Self::Unauthorized(message),
            429 | 500..=599 => Self::Transient { status: status.as_u16(), message },
            _ => Self::Api { status: status.as_u16(), message },
        }
    }

    /// Whether a retry might succeed. Nothing in this crate retries; the
    /// distinction is surfaced for callers.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            CloudError::from_status(StatusCode::NOT_FOUND, "x".into()),
            CloudError::NotFound(_)
        ));
        assert!(matches!(
            CloudError::from_status(StatusCode::CONFLICT, "x".into()),
            CloudError::AlreadyExists(_)
        ));
        assert!(matches!(
            CloudError::from_status(StatusCode::FORBIDDEN, "x".into()),
            CloudError::Unauthorized(_)
        ));
        assert!(matches!(
            CloudError::from_status(StatusCode::TOO_MANY_REQUESTS, "x".into()),
            CloudError::Transient { status: 429, .. }
        ));
        assert!(matches!(
            CloudError::from_status(StatusCode::BAD_GATEWAY, "x".into()),
            CloudError::Transient { status: 502, .. }
        ));
        assert!(matches!(
            CloudError::from_status(StatusCode::BAD_REQUEST, "x".into()),
            CloudError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_transient_detection() {
        assert!(CloudError::Transient { status: 503, message: String::new() }.is_transient());
        assert!(!CloudError::NotFound("x".into()).is_transient());
        assert!(!CloudError::AlreadyExists("x".into()).is_transient());
    }
}
