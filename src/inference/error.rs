/// Typed failure of one call to an external collaborator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// The service answered with a non-2xx status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// No usable response (timeout, refused connection, reset, ...)
    #[error("{endpoint} transport failure: {message}")]
    Transport {
        endpoint: String,
        message: String,
        timed_out: bool,
    },

    /// The response body did not have the expected structure
    #[error("{endpoint} returned an unexpected response: {message}")]
    Shape { endpoint: String, message: String },

    /// The request could not be issued or its result could not be applied
    #[error("invalid request: {message}")]
    InvalidInput { message: String },
}

impl InferenceError {
    pub fn transport(endpoint: &str, err: &reqwest::Error) -> Self {
        InferenceError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    pub fn shape(endpoint: &str, message: impl Into<String>) -> Self {
        InferenceError::Shape {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// HTTP status code, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            InferenceError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Transport { timed_out: true, .. })
    }
}
