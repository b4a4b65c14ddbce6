// # DNSimple DNS Provider
//
// Config adapter for the `tls.dns.dnsimple` module.
//
// ```json
// {
//   "access_token": "<account OAuth token>",
//   "ttl": 300
// }
// ```
//
// Unset fields keep the library default (`DNSIMPLE_*` environment
// variables, then built-in constants).

pub mod provider;

pub use provider::{Config, DnsimpleProvider, new_default_config, new_dns_provider_config};

use serde::{Deserialize, Serialize};
use tlsdns_core::common::set_if_not_empty;
use tlsdns_core::registry::SolverRegistry;
use tlsdns_core::{ChallengeProvider, CommonConfig, DnsProviderMaker, Result};

/// JSON configuration of the `tls.dns.dnsimple` module
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DNSimple {
    /// An OAuth2 token from your account
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,

    #[serde(flatten)]
    pub common: CommonConfig,
}

impl std::fmt::Debug for DNSimple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DNSimple")
            .field("access_token", &"<REDACTED>")
            .field("common", &self.common)
            .finish()
    }
}

impl DNSimple {
    /// Library configuration: environment defaults overlaid with the
    /// access token and the common settings that are set
    pub fn library_config(&self) -> Result<Config> {
        let mut config = new_default_config();
        set_if_not_empty(&mut config.access_token, &self.access_token);
        self.common.apply_to(&mut config)?;
        Ok(config)
    }

    /// Build the DNSimple challenge provider
    ///
    /// A missing access token is reported by the library constructor.
    pub fn new_dns_provider(&self) -> Result<DnsimpleProvider> {
        new_dns_provider_config(self.library_config()?)
    }
}

impl DnsProviderMaker for DNSimple {
    const MODULE_ID: &'static str = "tls.dns.dnsimple";

    fn make_provider(&self) -> Result<Box<dyn ChallengeProvider>> {
        Ok(Box::new(self.new_dns_provider()?))
    }
}

/// Register the DNSimple module with the registry
pub fn register(registry: &SolverRegistry) -> Result<()> {
    registry.register::<DNSimple>()
}
