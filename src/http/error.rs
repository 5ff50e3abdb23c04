use thiserror::Error;

/// A request that never produced an HTTP response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub message: String,
    pub timed_out: bool,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        Self {
            timed_out: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

/// Failure of a single logical GET issued through [`crate::RateLimitAwareClient`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection reset/refused, timeout or any other transport-level problem.
    #[error("Transient failure requesting {url}: {source}")]
    Transient {
        url: String,
        #[source]
        source: TransportFailure,
    },

    /// HTTP 429 or an `estado: 429` body.
    #[error("Rate limited while requesting {url}")]
    RateLimited { url: String },

    /// Any other non-2xx status or an unparsable body. Never retried.
    #[error("Request to {url} failed permanently: {reason}")]
    Permanent { url: String, reason: String },

    /// Every attempt failed with a retryable error.
    #[error("Giving up on {url} after {attempts} attempts")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient { .. } | FetchError::RateLimited { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Transient { url, .. }
            | FetchError::RateLimited { url }
            | FetchError::Permanent { url, .. }
            | FetchError::Exhausted { url, .. } => url,
        }
    }
}
