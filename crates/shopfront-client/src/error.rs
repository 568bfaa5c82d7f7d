use shopfront_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Non-2xx status other than 401, with the backend's message when it sent one.
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    /// HTTP 401. The session has already been cleared when this is returned.
    #[error("unauthorized request to {url}: {message}")]
    Unauthorized { url: String, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("all {attempts} candidate endpoints failed for {operation}: {last}")]
    AllCandidatesFailed {
        operation: String,
        attempts: usize,
        #[source]
        last: Box<ApiError>,
    },

    #[error("no candidate endpoints configured for {operation}")]
    NoCandidates { operation: String },

    #[error("login response did not include a token")]
    MissingToken,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("cart controller is closed")]
    Closed,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    /// HTTP status carried by the error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::AllCandidatesFailed { last, .. } => last.status(),
            _ => None,
        }
    }

    /// `true` for failures that mean the caller has no usable session.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. } | ApiError::NotAuthenticated)
    }
}
