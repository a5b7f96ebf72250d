use thiserror::Error;

/// Failures of a single exchange with a backend, or misuse of the session
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection refused, timeouts and I/O failures while talking to the
    /// backend.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("backend responded with status {status}: {body}")]
    Http { status: u16, body: String },

    /// A body or stream line that isn't a valid response object.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// An error payload returned by the backend in place of a response.
    #[error("backend returned an error: {0}")]
    Backend(String),

    /// Usage errors such as cloning a branch before any session exists.
    #[error("invalid session state: {0}")]
    SessionState(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        return matches!(self, ClientError::Network(_));
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> ClientError {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }

        return ClientError::Network(err.to_string());
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> ClientError {
        return ClientError::Network(err.to_string());
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> ClientError {
        return ClientError::Decode(err.to_string());
    }
}
