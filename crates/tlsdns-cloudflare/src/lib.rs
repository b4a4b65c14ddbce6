// # Cloudflare DNS Provider
//
// Config adapter for the `tls.dns.cloudflare` module. It reads the JSON
// configuration a host embeds for the module, copies every explicitly set
// field onto the Cloudflare library configuration and builds the DNS-01
// challenge provider from it.
//
// ## Configuration
//
// ```json
// {
//   "api_token": "<Zone / DNS / Edit token>",
//   "zone_api_token": "<Zone / Zone / Read token>",
//   "ttl": 300,
//   "propagation_timeout": "5m",
//   "polling_interval": "10s"
// }
// ```
//
// Unset fields keep the library default, which includes the
// `CLOUDFLARE_*` / `CF_*` environment variables. See [`provider`].
//
// ## Security Requirements
//
// - API tokens NEVER appear in logs or Debug output

pub mod provider;

pub use provider::{CloudflareProvider, Config, new_default_config, new_dns_provider_config};

use serde::{Deserialize, Serialize};
use tlsdns_core::common::set_if_not_empty;
use tlsdns_core::registry::SolverRegistry;
use tlsdns_core::{ChallengeProvider, CommonConfig, DnsProviderMaker, Result};

/// JSON configuration of the `tls.dns.cloudflare` module
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cloudflare {
    /// API token with `Zone / DNS / Edit` permission
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_token: String,

    /// Optional API token with `Zone / Zone / Read` permission
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zone_api_token: String,

    #[serde(flatten)]
    pub common: CommonConfig,
}

impl std::fmt::Debug for Cloudflare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cloudflare")
            .field("api_token", &"<REDACTED>")
            .field("zone_api_token", &"<REDACTED>")
            .field("common", &self.common)
            .finish()
    }
}

impl Cloudflare {
    /// Library configuration: defaults overlaid with every set field
    pub fn library_config(&self) -> Result<Config> {
        let mut config = new_default_config();

        set_if_not_empty(&mut config.auth_token, &self.api_token);
        set_if_not_empty(&mut config.zone_token, &self.zone_api_token);
        self.common.apply_to(&mut config)?;

        Ok(config)
    }

    /// Build the Cloudflare challenge provider
    ///
    /// Constructor errors (missing credentials, TTL below 120) are returned
    /// unmodified.
    pub fn new_dns_provider(&self) -> Result<CloudflareProvider> {
        new_dns_provider_config(self.library_config()?)
    }
}

impl DnsProviderMaker for Cloudflare {
    const MODULE_ID: &'static str = "tls.dns.cloudflare";

    fn make_provider(&self) -> Result<Box<dyn ChallengeProvider>> {
        Ok(Box::new(self.new_dns_provider()?))
    }
}

/// Register the Cloudflare module with the registry
pub fn register(registry: &SolverRegistry) -> Result<()> {
    registry.register::<Cloudflare>()
}
