//! Error type shared by providers, the optimizer and the HTTP API.

use thiserror::Error;

/// Errors produced while optimizing a tour.
///
/// Nothing in this crate retries or swallows these; they travel unchanged
/// from the provider to the caller.
#[derive(Error, Debug)]
pub enum RoutingError {
    /// The request itself is unusable (empty stop list, bad coordinates).
    ///
    /// Raised before any computation or network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A provider is missing credentials or a config value is invalid.
    ///
    /// Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The routing backend failed or answered with something unusable.
    #[error("{provider} upstream error: {message}")]
    Upstream {
        /// Name of the provider that failed.
        provider: &'static str,
        /// Status code or message reported by the backend.
        message: String,
    },

    /// The caller abandoned the request before the provider answered.
    #[error("route optimization cancelled")]
    Cancelled,
}

impl RoutingError {
    /// Builds an [`RoutingError::Upstream`] for `provider`.
    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        RoutingError::Upstream {
            provider,
            message: message.into(),
        }
    }

    /// Maps a `reqwest` transport error, calling out timeouts explicitly.
    pub(crate) fn from_http(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::upstream(provider, format!("request timed out: {}", err))
        } else {
            Self::upstream(provider, format!("request failed: {}", err))
        }
    }

    /// Short machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingError::Validation(_) => "VALIDATION",
            RoutingError::Configuration(_) => "CONFIGURATION",
            RoutingError::Upstream { .. } => "UPSTREAM",
            RoutingError::Cancelled => "CANCELLED",
        }
    }

    /// Returns `true` for failures a different provider might not have.
    pub fn is_upstream(&self) -> bool {
        matches!(self, RoutingError::Upstream { .. })
    }
}
