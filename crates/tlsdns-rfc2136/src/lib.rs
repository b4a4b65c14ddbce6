// # RFC 2136 DNS Provider
//
// Config adapter for the `tls.dns.rfc2136` module, plus the library that
// talks to the nameserver:
//
// - `update`: UPDATE messages and their UDP/TCP delivery
// - `tsig`: HMAC transaction signatures for those messages
// - `provider`: library configuration, zone discovery and challenge provider
//
// ## Configuration
//
// ```json
// {
//   "nameserver": "ns1.example.com:53",
//   "tsig_algorithm": "hmac-sha256.",
//   "tsig_key": "acme-key.",
//   "tsig_secret": "<base64>",
//   "dns_client": { "sequence_interval": "30s", "dns_timeout": "5s" }
// }
// ```
//
// `base_url` and `http_client` have no meaning for this provider and are
// ignored.

pub mod provider;
pub mod tsig;
pub mod update;

pub use provider::{Config, Rfc2136Provider, new_default_config, new_dns_provider_config};

use serde::{Deserialize, Serialize};
use tlsdns_core::common::{set_duration_if_nonzero, set_if_not_empty};
use tlsdns_core::registry::SolverRegistry;
use tlsdns_core::{ChallengeProvider, CommonConfig, DnsProviderMaker, Duration, Result};

/// DNS client settings of the `tls.dns.rfc2136` module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsClientConfig {
    /// Time between challenges, which are solved one at a time
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub sequence_interval: Duration,

    /// Maximum time to wait for the nameserver
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub dns_timeout: Duration,
}

impl DnsClientConfig {
    fn is_empty(&self) -> bool {
        self.sequence_interval.is_zero() && self.dns_timeout.is_zero()
    }
}

/// JSON configuration of the `tls.dns.rfc2136` module
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rfc2136 {
    /// Network address in the form "host" or "host:port"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nameserver: String,

    /// Defaults to `hmac-md5.sig-alg.reg.int.`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tsig_algorithm: String,

    /// Name of the key as defined in the DNS server configuration
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tsig_key: String,

    /// Secret of the key as defined in the DNS server configuration
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tsig_secret: String,

    #[serde(default, skip_serializing_if = "DnsClientConfig::is_empty")]
    pub dns_client: DnsClientConfig,

    #[serde(flatten)]
    pub common: CommonConfig,
}

impl std::fmt::Debug for Rfc2136 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rfc2136")
            .field("nameserver", &self.nameserver)
            .field("tsig_algorithm", &self.tsig_algorithm)
            .field("tsig_key", &self.tsig_key)
            .field("tsig_secret", &"<REDACTED>")
            .field("dns_client", &self.dns_client)
            .field("common", &self.common)
            .finish()
    }
}

impl Rfc2136 {
    /// Library configuration: environment defaults overlaid with the
    /// non-empty fields of this module and its common settings
    pub fn library_config(&self) -> Result<Config> {
        let mut config = new_default_config();

        set_if_not_empty(&mut config.nameserver, &self.nameserver);
        set_if_not_empty(&mut config.tsig_algorithm, &self.tsig_algorithm);
        set_if_not_empty(&mut config.tsig_key, &self.tsig_key);
        set_if_not_empty(&mut config.tsig_secret, &self.tsig_secret);
        set_duration_if_nonzero(&mut config.sequence_interval, self.dns_client.sequence_interval);
        set_duration_if_nonzero(&mut config.dns_timeout, self.dns_client.dns_timeout);
        self.common.apply_to(&mut config)?;

        Ok(config)
    }

    /// Build the challenge provider; TSIG settings are checked on first use
    pub fn new_dns_provider(&self) -> Result<Rfc2136Provider> {
        new_dns_provider_config(self.library_config()?)
    }
}

impl DnsProviderMaker for Rfc2136 {
    const MODULE_ID: &'static str = "tls.dns.rfc2136";

    fn make_provider(&self) -> Result<Box<dyn ChallengeProvider>> {
        Ok(Box::new(self.new_dns_provider()?))
    }
}

/// Register the RFC 2136 module with the registry
pub fn register(registry: &SolverRegistry) -> Result<()> {
    registry.register::<Rfc2136>()
}
