use okr_core::CoreError;

/// Errors from the API client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("API error ({status}): {detail}")]
    Api {
        status: u16,
        /// The `detail` message of the error body, or the status reason.
        detail: String,
    },

    /// A payload failed domain validation before it was sent, or a
    /// response failed it after decoding.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An environment variable held an unusable value.
    #[error("Invalid configuration for {var}: {message}")]
    Config { var: String, message: String },
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
