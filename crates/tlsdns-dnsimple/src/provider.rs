//! DNSimple DNS-01 provider library
//!
//! ## API Reference
//!
//! - DNSimple API v2: https://developer.dnsimple.com/v2/
//! - Whoami: GET `/v2/whoami`
//! - Get Zone: GET `/v2/:account/zones/:zone`
//! - Create Record: POST `/v2/:account/zones/:zone/records`
//! - List Records: GET `/v2/:account/zones/:zone/records?name=...&type=TXT`
//! - Delete Record: DELETE `/v2/:account/zones/:zone/records/:record_id`

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tlsdns_core::challenge::{
    self, DEFAULT_POLLING_INTERVAL, DEFAULT_PROPAGATION_TIMEOUT, DEFAULT_TTL,
};
use tlsdns_core::common::ProviderSettings;
use tlsdns_core::env::{self, Lookup, ProcessEnv};
use tlsdns_core::{ChallengeProvider, Error, Result};
use tokio::sync::OnceCell;

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "dnsimple";

/// DNSimple production API
pub const DEFAULT_BASE_URL: &str = "https://api.dnsimple.com";

/// Overall timeout of the default HTTP client
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Library configuration for the DNSimple provider
#[derive(Clone)]
pub struct Config {
    /// OAuth access token of an account; ⚠️ NEVER log this value
    pub access_token: String,
    pub base_url: String,
    pub ttl: i64,
    pub propagation_timeout: Duration,
    pub polling_interval: Duration,
    pub http_timeout: Duration,
    pub http_client: Option<reqwest::Client>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("ttl", &self.ttl)
            .field("propagation_timeout", &self.propagation_timeout)
            .field("polling_interval", &self.polling_interval)
            .field("http_timeout", &self.http_timeout)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            ttl: DEFAULT_TTL,
            propagation_timeout: DEFAULT_PROPAGATION_TIMEOUT,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            http_client: None,
        }
    }
}

impl Config {
    /// Built-in defaults overlaid with variables from `vars`
    pub fn from_lookup(vars: &impl Lookup) -> Self {
        let defaults = Self::default();
        Self {
            access_token: env::get_or_default_string(vars, "DNSIMPLE_OAUTH_TOKEN", ""),
            base_url: env::get_or_default_string(vars, "DNSIMPLE_BASE_URL", &defaults.base_url),
            ttl: env::get_or_default_int(vars, "DNSIMPLE_TTL", defaults.ttl),
            propagation_timeout: env::get_or_default_second(
                vars,
                "DNSIMPLE_PROPAGATION_TIMEOUT",
                defaults.propagation_timeout,
            ),
            polling_interval: env::get_or_default_second(
                vars,
                "DNSIMPLE_POLLING_INTERVAL",
                defaults.polling_interval,
            ),
            http_timeout: env::get_or_default_second(
                vars,
                "DNSIMPLE_HTTP_TIMEOUT",
                defaults.http_timeout,
            ),
            http_client: None,
        }
    }
}

/// Default configuration: built-in defaults overlaid with the environment
pub fn new_default_config() -> Config {
    Config::from_lookup(&ProcessEnv)
}

impl ProviderSettings for Config {
    fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
    }

    fn set_ttl(&mut self, ttl: i64) {
        self.ttl = ttl;
    }

    fn set_propagation_timeout(&mut self, timeout: Duration) {
        self.propagation_timeout = timeout;
    }

    fn set_polling_interval(&mut self, interval: Duration) {
        self.polling_interval = interval;
    }

    fn set_http_client(&mut self, client: reqwest::Client) {
        self.http_client = Some(client);
    }
}

/// Build a DNSimple challenge provider from a library configuration
///
/// # Errors
///
/// Returns `dnsimple: OAuth token is missing` when no access token is set.
pub fn new_dns_provider_config(config: Config) -> Result<DnsimpleProvider> {
    if config.access_token.is_empty() {
        return Err(Error::provider(PROVIDER_NAME, "OAuth token is missing"));
    }

    let client = match &config.http_client {
        Some(client) => client.clone(),
        None => reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?,
    };

    let base_url = if config.base_url.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        config.base_url.trim_end_matches('/').to_string()
    };

    tracing::debug!(base_url = %base_url, ttl = config.ttl, "Created DNSimple provider");

    Ok(DnsimpleProvider {
        config,
        base_url,
        client,
        account_id: OnceCell::new(),
    })
}

/// DNSimple API v2 response wrapper
#[derive(Debug, Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Whoami {
    account: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Zone {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ZoneRecord {
    id: u64,
}

/// DNSimple challenge provider
///
/// The account ID is looked up once, on first use.
pub struct DnsimpleProvider {
    config: Config,
    base_url: String,
    client: reqwest::Client,
    account_id: OnceCell<u64>,
}

impl std::fmt::Debug for DnsimpleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsimpleProvider")
            .field("config", &self.config)
            .finish()
    }
}

impl DnsimpleProvider {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send a request; `Ok(None)` when the API answers 404
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<Option<T>> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("{action}: HTTP request failed: {e}"))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        if !status.is_success() {
            return Err(Error::from_status(
                PROVIDER_NAME,
                status.as_u16(),
                &format!("{action}: {body}"),
            ));
        }

        // DELETE answers 204 with no body
        if body.trim().is_empty() {
            return Ok(None);
        }

        let parsed: Data<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER_NAME, format!("{action}: failed to parse response: {e}"))
        })?;
        Ok(Some(parsed.data))
    }

    async fn account_id(&self) -> Result<u64> {
        self.account_id
            .get_or_try_init(|| async {
                let request = self.client.get(format!("{}/v2/whoami", self.base_url));
                let whoami: Whoami = self.send(request, "whoami").await?.ok_or_else(|| {
                    Error::provider(PROVIDER_NAME, "whoami: empty response")
                })?;

                let account = whoami.account.ok_or_else(|| {
                    Error::provider(
                        PROVIDER_NAME,
                        "user tokens are not supported, please use an account token",
                    )
                })?;
                tracing::debug!(account_id = account.id, "Resolved DNSimple account");
                Ok::<u64, Error>(account.id)
            })
            .await
            .copied()
    }

    /// Find the zone holding `fqdn` by walking its parents
    async fn zone_for(&self, account_id: u64, fqdn: &str) -> Result<String> {
        for candidate in challenge::candidate_zones(fqdn) {
            let request = self.client.get(format!(
                "{}/v2/{}/zones/{}",
                self.base_url, account_id, candidate
            ));
            if let Some(zone) = self.send::<Zone>(request, "get zone").await? {
                tracing::debug!(zone = %zone.name, "Found zone");
                return Ok(zone.name);
            }
        }

        Err(Error::not_found(format!(
            "{PROVIDER_NAME}: no zone found for {fqdn}"
        )))
    }

    fn records_url(&self, account_id: u64, zone: &str) -> String {
        format!("{}/v2/{}/zones/{}/records", self.base_url, account_id, zone)
    }
}

#[async_trait]
impl ChallengeProvider for DnsimpleProvider {
    async fn present(&self, domain: &str, _token: &str, key_auth: &str) -> Result<()> {
        let record = challenge::get_record(domain, key_auth);
        let account_id = self.account_id().await?;
        let zone = self.zone_for(account_id, &record.fqdn).await?;
        let name = challenge::relative_name(&record.fqdn, &zone);

        let payload = serde_json::json!({
            "name": name,
            "type": "TXT",
            "content": record.value,
            "ttl": self.config.ttl,
        });

        let request = self
            .client
            .post(self.records_url(account_id, &zone))
            .json(&payload);
        let created: ZoneRecord = self
            .send(request, "create record")
            .await?
            .ok_or_else(|| Error::provider(PROVIDER_NAME, "create record: empty response"))?;

        tracing::info!(
            record = %record.fqdn,
            record_id = created.id,
            "Created challenge TXT record"
        );
        Ok(())
    }

    async fn cleanup(&self, domain: &str, _token: &str, key_auth: &str) -> Result<()> {
        let record = challenge::get_record(domain, key_auth);
        let account_id = self.account_id().await?;
        let zone = self.zone_for(account_id, &record.fqdn).await?;
        let name = challenge::relative_name(&record.fqdn, &zone);

        let request = self
            .client
            .get(self.records_url(account_id, &zone))
            .query(&[("name", name), ("type", "TXT")]);
        let records: Vec<ZoneRecord> = self
            .send(request, "list records")
            .await?
            .unwrap_or_default();

        for found in records {
            let request = self.client.delete(format!(
                "{}/{}",
                self.records_url(account_id, &zone),
                found.id
            ));
            self.send::<serde_json::Value>(request, "delete record").await?;
            tracing::info!(
                record = %record.fqdn,
                record_id = found.id,
                "Deleted challenge TXT record"
            );
        }

        Ok(())
    }

    fn timeout(&self) -> (Duration, Duration) {
        (self.config.propagation_timeout, self.config.polling_interval)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
