// # Challenge Provider Trait
//
// Defines the interface the host uses to solve ACME DNS-01 challenges.
//
// ## Implementations
//
// - Cloudflare: `tlsdns-cloudflare` crate
// - DNSimple: `tlsdns-dnsimple` crate
// - RFC 2136 dynamic updates: `tlsdns-rfc2136` crate
//
// ## Usage
//
// ```rust,ignore
// use tlsdns_core::{ChallengeProvider, DnsProviderMaker};
//
// #[tokio::main]
// async fn main() -> tlsdns_core::Result<()> {
//     let adapter: tlsdns_cloudflare::Cloudflare = serde_json::from_str(json)?;
//     let provider = adapter.new_dns_provider()?;
//
//     provider.present("example.com", "token", "token.thumbprint").await?;
//     // ... let the CA validate ...
//     provider.cleanup("example.com", "token", "token.thumbprint").await?;
//
//     Ok(())
// }
// ```

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;

/// A DNS-01 challenge solver
///
/// Providers publish the challenge TXT record in `present` and remove it in
/// `cleanup`. Waiting for propagation is the host's job; `timeout` tells it
/// how long to wait and how often to check.
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks.
///
/// # Retries
///
/// Providers make their API calls once and return the error on failure.
/// They never retry, back off or spawn background tasks.
#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    /// Publish the challenge record for `domain`
    ///
    /// # Parameters
    ///
    /// - `domain`: The domain being validated (e.g., "example.com")
    /// - `token`: The ACME challenge token
    /// - `key_auth`: The key authorization for `token`
    async fn present(&self, domain: &str, token: &str, key_auth: &str) -> Result<()>;

    /// Remove the challenge record published by `present`
    ///
    /// Called with the same arguments as `present`, whether or not
    /// validation succeeded.
    async fn cleanup(&self, domain: &str, token: &str, key_auth: &str) -> Result<()>;

    /// Propagation timeout and polling interval
    fn timeout(&self) -> (Duration, Duration);

    /// Interval to wait between challenges when they must be solved one at
    /// a time, or `None` when they can run concurrently
    fn sequential(&self) -> Option<Duration> {
        None
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Adapter configuration that can build a challenge provider
///
/// Implemented by each provider crate's JSON configuration struct.
pub trait DnsProviderMaker {
    /// Module identifier, `tls.dns.<provider-name>`
    const MODULE_ID: &'static str;

    /// Build the challenge provider from this configuration
    ///
    /// Errors from the provider library's constructor are returned
    /// unmodified.
    fn make_provider(&self) -> Result<Box<dyn ChallengeProvider>>;
}

/// Helper trait for constructing challenge providers from configuration
pub trait ChallengeProviderFactory: Send + Sync {
    /// Create a provider from the module's raw JSON configuration
    ///
    /// # Parameters
    ///
    /// - `config`: The JSON object embedded in the host's configuration
    ///
    /// # Returns
    ///
    /// A boxed ChallengeProvider trait object
    fn create(&self, config: &[u8]) -> Result<Box<dyn ChallengeProvider>>;
}

/// Factory that deserializes a [`DnsProviderMaker`] and builds its provider
///
/// Empty (or whitespace-only) input yields the all-default configuration.
pub struct JsonFactory<T>(PhantomData<fn() -> T>);

impl<T> JsonFactory<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChallengeProviderFactory for JsonFactory<T>
where
    T: DnsProviderMaker + DeserializeOwned + Default,
{
    fn create(&self, config: &[u8]) -> Result<Box<dyn ChallengeProvider>> {
        let maker: T = if config.iter().all(u8::is_ascii_whitespace) {
            T::default()
        } else {
            serde_json::from_slice(config)?
        };
        tracing::debug!(module = T::MODULE_ID, "Creating challenge provider");
        maker.make_provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde::Deserialize;

    struct NoopProvider;

    #[async_trait]
    impl ChallengeProvider for NoopProvider {
        async fn present(&self, _domain: &str, _token: &str, _key_auth: &str) -> Result<()> {
            Ok(())
        }
        async fn cleanup(&self, _domain: &str, _token: &str, _key_auth: &str) -> Result<()> {
            Ok(())
        }
        fn timeout(&self) -> (Duration, Duration) {
            (Duration::from_secs(60), Duration::from_secs(2))
        }
        fn provider_name(&self) -> &'static str {
            "noop"
        }
    }

    #[derive(Default, Deserialize)]
    struct NoopConfig {
        #[serde(default)]
        token: String,
    }

    impl DnsProviderMaker for NoopConfig {
        const MODULE_ID: &'static str = "tls.dns.noop";

        fn make_provider(&self) -> Result<Box<dyn ChallengeProvider>> {
            if self.token.is_empty() {
                return Err(Error::provider("noop", "token missing"));
            }
            Ok(Box::new(NoopProvider))
        }
    }

    #[test]
    fn json_factory_builds_provider() {
        let factory = JsonFactory::<NoopConfig>::new();
        let provider = factory.create(br#"{"token":"abc"}"#).unwrap();
        assert_eq!(provider.provider_name(), "noop");
        assert_eq!(provider.sequential(), None);
    }

    #[test]
    fn json_factory_passes_library_errors_through() {
        let factory = JsonFactory::<NoopConfig>::new();
        let err = factory.create(b"").err().unwrap();
        assert_eq!(err.to_string(), "noop: token missing");
    }

    #[test]
    fn json_factory_rejects_malformed_json() {
        let factory = JsonFactory::<NoopConfig>::new();
        assert!(matches!(factory.create(b"{not json").err(), Some(Error::Json(_))));
    }

    #[tokio::test]
    async fn boxed_provider_delegates() {
        let provider: Box<dyn ChallengeProvider> = Box::new(NoopProvider);
        provider.present("example.com", "t", "k").await.unwrap();
        assert_eq!(provider.timeout().1, Duration::from_secs(2));
    }
}
