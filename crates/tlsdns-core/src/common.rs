//! Configuration shared by all DNS providers
//!
//! Not every provider honours every field. Configuring a field a provider
//! does not support is not an error; it is simply not used.
//!
//! ## Zero means default
//!
//! Every field is "unset unless explicitly provided". A zero or empty value
//! leaves the provider library's default in place, so a legitimately-zero
//! setting (for example `ttl: 0`) cannot be expressed. This is a known
//! limitation.

use crate::duration::Duration;
use crate::error::Result;
use crate::httpclient::HttpClientConfig;
use serde::{Deserialize, Serialize};

/// Common configuration embedded in every provider's JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonConfig {
    /// The base URL to use for the provider API
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// TTL of the TXT record used for the DNS challenge
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: i64,

    /// Maximum waiting time for DNS propagation
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub propagation_timeout: Duration,

    /// Time between DNS propagation checks
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub polling_interval: Duration,

    /// HTTP client customizations, if necessary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_client: Option<HttpClientConfig>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Setters a provider library configuration exposes for the common fields
///
/// `set_base_url` and `set_http_client` default to no-ops for libraries
/// that have no such setting.
pub trait ProviderSettings {
    fn set_base_url(&mut self, _base_url: &str) {}
    fn set_ttl(&mut self, ttl: i64);
    fn set_propagation_timeout(&mut self, timeout: std::time::Duration);
    fn set_polling_interval(&mut self, interval: std::time::Duration);
    fn set_http_client(&mut self, _client: reqwest::Client) {}
}

impl CommonConfig {
    /// Copy every explicitly set field onto a library configuration
    ///
    /// Zero/empty fields are skipped so the library default stays in place.
    /// Values are not validated. The only error is failing to build the
    /// configured HTTP client.
    pub fn apply_to<S: ProviderSettings + ?Sized>(&self, settings: &mut S) -> Result<()> {
        if !self.base_url.is_empty() {
            settings.set_base_url(&self.base_url);
        }
        if self.ttl != 0 {
            settings.set_ttl(self.ttl);
        }
        if !self.propagation_timeout.is_zero() {
            settings.set_propagation_timeout(self.propagation_timeout.as_std());
        }
        if !self.polling_interval.is_zero() {
            settings.set_polling_interval(self.polling_interval.as_std());
        }
        if let Some(http_client) = &self.http_client {
            settings.set_http_client(http_client.http_client()?);
        }
        Ok(())
    }
}

/// Overwrite `target` when `value` is non-empty
pub fn set_if_not_empty(target: &mut String, value: &str) {
    if !value.is_empty() {
        *target = value.to_string();
    }
}

/// Overwrite `target` when `value` is not the zero value of its type
pub fn set_if_nonzero<T: Default + PartialEq>(target: &mut T, value: T) {
    if value != T::default() {
        *target = value;
    }
}

/// Overwrite `target` when `value` is non-zero
pub fn set_duration_if_nonzero(target: &mut std::time::Duration, value: Duration) {
    if !value.is_zero() {
        *target = value.as_std();
    }
}
