//! Error types for the DNS-01 provider adapters
//!
//! Adapters never wrap or translate errors: what a provider library's
//! constructor or solver returns is what the host sees.

use thiserror::Error;

/// Result type alias for adapter and provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by all provider crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (unknown module, malformed value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (building the client or talking to a provider API)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// DNS protocol errors (dynamic updates, SOA lookups)
    #[error("DNS error: {0}")]
    Dns(String),

    /// Provider library error, rendered the way the library reports it
    #[error("{provider}: {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a DNS protocol error
    pub fn dns(msg: impl Into<String>) -> Self {
        Self::Dns(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map an HTTP status from a provider API to an error
    ///
    /// 401/403 become authentication errors, 404 not found, 429 rate
    /// limited; anything else keeps the provider name and response body.
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!(
                "{provider}: invalid credentials or insufficient permissions (status {status})"
            )),
            404 => Self::not_found(format!("{provider}: {body}")),
            429 => Self::rate_limited(format!("{provider}: too many requests (status {status})")),
            500..=599 => Self::provider(
                provider,
                format!("server error (transient): {status} - {body}"),
            ),
            _ => Self::provider(provider, format!("unexpected status {status} - {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_renders_like_the_library() {
        let err = Error::provider("rfc2136", "nameserver missing");
        assert_eq!(err.to_string(), "rfc2136: nameserver missing");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            Error::from_status("cloudflare", 403, ""),
            Error::Authentication(_)
        ));
        assert!(matches!(
            Error::from_status("cloudflare", 404, "gone"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            Error::from_status("cloudflare", 429, ""),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            Error::from_status("cloudflare", 502, "bad gateway"),
            Error::Provider { .. }
        ));
    }
}
