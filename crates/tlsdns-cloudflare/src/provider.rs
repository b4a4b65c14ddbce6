//! Cloudflare DNS-01 provider library
//!
//! Library configuration with built-in defaults, the constructor that checks
//! it, and the challenge provider talking to Cloudflare API v4.
//!
//! ## API Reference
//!
//! - Cloudflare API v4: https://developers.cloudflare.com/api/
//! - List Zones: GET `/zones?name=...`
//! - Create DNS Record: POST `/zones/:zone_id/dns_records`
//! - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tlsdns_core::challenge::{self, DEFAULT_POLLING_INTERVAL, DEFAULT_TTL};
use tlsdns_core::common::ProviderSettings;
use tlsdns_core::env::{self, Lookup, ProcessEnv};
use tlsdns_core::{ChallengeProvider, Error, Result};
use tokio::sync::Mutex;

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "cloudflare";

/// Cloudflare API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Smallest TTL Cloudflare accepts for a non-automatic record
pub const MIN_TTL: i64 = 120;

/// Default maximum wait for propagation
pub const DEFAULT_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Default HTTP timeout for API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Library configuration for the Cloudflare provider
///
/// Either `auth_token` or both `auth_email` and `auth_key` must be set.
/// The Debug implementation does not expose credentials.
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub auth_email: String,
    /// Global API key; ⚠️ NEVER log this value
    pub auth_key: String,
    /// API token with `Zone / DNS / Edit`; ⚠️ NEVER log this value
    pub auth_token: String,
    /// Optional API token with `Zone / Zone / Read`, used for zone lookups
    pub zone_token: String,
    pub ttl: i64,
    pub propagation_timeout: Duration,
    pub polling_interval: Duration,
    /// Timeout of the default HTTP client
    pub http_timeout: Duration,
    /// Custom HTTP client; a client with `http_timeout` is built when unset
    pub http_client: Option<reqwest::Client>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("auth_email", &self.auth_email)
            .field("auth_key", &redacted(&self.auth_key))
            .field("auth_token", &redacted(&self.auth_token))
            .field("zone_token", &redacted(&self.zone_token))
            .field("ttl", &self.ttl)
            .field("propagation_timeout", &self.propagation_timeout)
            .field("polling_interval", &self.polling_interval)
            .field("http_timeout", &self.http_timeout)
            .field("http_client", &self.http_client.is_some())
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<REDACTED>" }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_email: String::new(),
            auth_key: String::new(),
            auth_token: String::new(),
            zone_token: String::new(),
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
            base_url: defaults.base_url,
            auth_email: env::get_one_with_fallback(vars, &["CLOUDFLARE_EMAIL", "CF_API_EMAIL"])
                .unwrap_or_default(),
            auth_key: env::get_one_with_fallback(vars, &["CLOUDFLARE_API_KEY", "CF_API_KEY"])
                .unwrap_or_default(),
            auth_token: env::get_one_with_fallback(
                vars,
                &["CLOUDFLARE_DNS_API_TOKEN", "CF_DNS_API_TOKEN"],
            )
            .unwrap_or_default(),
            zone_token: env::get_one_with_fallback(
                vars,
                &["CLOUDFLARE_ZONE_API_TOKEN", "CF_ZONE_API_TOKEN"],
            )
            .unwrap_or_default(),
            ttl: env::get_or_default_int(vars, "CLOUDFLARE_TTL", defaults.ttl),
            propagation_timeout: env::get_or_default_second(
                vars,
                "CLOUDFLARE_PROPAGATION_TIMEOUT",
                defaults.propagation_timeout,
            ),
            polling_interval: env::get_or_default_second(
                vars,
                "CLOUDFLARE_POLLING_INTERVAL",
                defaults.polling_interval,
            ),
            http_timeout: env::get_or_default_second(
                vars,
                "CLOUDFLARE_HTTP_TIMEOUT",
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

/// Build a Cloudflare challenge provider from a library configuration
///
/// # Errors
///
/// - no API token and not both email and API key
/// - TTL below [`MIN_TTL`]
/// - the default HTTP client cannot be built
pub fn new_dns_provider_config(config: Config) -> Result<CloudflareProvider> {
    if config.auth_token.is_empty() && (config.auth_email.is_empty() || config.auth_key.is_empty())
    {
        return Err(Error::provider(
            PROVIDER_NAME,
            "some credentials information are missing",
        ));
    }

    if config.ttl < MIN_TTL {
        return Err(Error::provider(
            PROVIDER_NAME,
            format!(
                "invalid TTL, TTL ({}) must be greater than {}",
                config.ttl, MIN_TTL
            ),
        ));
    }

    let client = match &config.http_client {
        Some(client) => client.clone(),
        None => reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?,
    };

    tracing::debug!(
        base_url = %config.base_url,
        ttl = config.ttl,
        token_auth = !config.auth_token.is_empty(),
        "Created Cloudflare provider"
    );

    Ok(CloudflareProvider {
        base_url: config.base_url.trim_end_matches('/').to_string(),
        config,
        client,
        records: Mutex::new(HashMap::new()),
    })
}

/// Which credential a request needs
#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Zone lookups (`Zone / Zone / Read`)
    Zone,
    /// Record changes (`Zone / DNS / Edit`)
    Dns,
}

/// A record created by `present`, remembered for `cleanup`
#[derive(Debug, Clone)]
struct CreatedRecord {
    zone_id: String,
    record_id: String,
}

/// Cloudflare API v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
}

fn describe(errors: &[ApiMessage]) -> String {
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cloudflare challenge provider
///
/// Created TXT records are remembered per challenge token between `present`
/// and `cleanup`.
pub struct CloudflareProvider {
    config: Config,
    base_url: String,
    client: reqwest::Client,
    records: Mutex<HashMap<String, CreatedRecord>>,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("config", &self.config)
            .finish()
    }
}

impl CloudflareProvider {
    /// The configuration this provider was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder, scope: Scope) -> reqwest::RequestBuilder {
        let token = match scope {
            Scope::Zone if !self.config.zone_token.is_empty() => &self.config.zone_token,
            _ => &self.config.auth_token,
        };

        if token.is_empty() {
            request
                .header("X-Auth-Email", &self.config.auth_email)
                .header("X-Auth-Key", &self.config.auth_key)
        } else {
            request.bearer_auth(token)
        }
    }

    /// Send a request and unwrap the API envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<Option<T>> {
        let response = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("{action}: HTTP request failed: {e}"))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());

        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let detail = match &parsed {
                Some(envelope) if !envelope.errors.is_empty() => describe(&envelope.errors),
                _ => body,
            };
            return Err(Error::from_status(
                PROVIDER_NAME,
                status.as_u16(),
                &format!("{action}: {detail}"),
            ));
        }

        let envelope = parsed.ok_or_else(|| {
            Error::provider(PROVIDER_NAME, format!("{action}: failed to parse response"))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("{action}: {}", describe(&envelope.errors)),
            ));
        }

        Ok(envelope.result)
    }

    /// Find the ID of the zone holding `fqdn`
    ///
    /// Tries the name and each of its parents until Cloudflare knows one of
    /// them as a zone.
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <zone token>
    /// ```
    async fn zone_id_for(&self, fqdn: &str) -> Result<String> {
        for candidate in challenge::candidate_zones(fqdn) {
            tracing::debug!(zone = candidate, "Looking up Cloudflare zone");

            let request = self
                .client
                .get(format!("{}/zones", self.base_url))
                .query(&[("name", candidate)]);
            let zones: Vec<Zone> = self
                .send(self.authorize(request, Scope::Zone), "zone lookup")
                .await?
                .unwrap_or_default();

            if let Some(zone) = zones.into_iter().next() {
                tracing::debug!(zone = candidate, zone_id = %zone.id, "Found zone");
                return Ok(zone.id);
            }
        }

        Err(Error::not_found(format!(
            "{PROVIDER_NAME}: no zone found for {fqdn}"
        )))
    }
}

#[async_trait]
impl ChallengeProvider for CloudflareProvider {
    /// Create the challenge TXT record
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// { "type": "TXT", "name": "_acme-challenge.example.com", "content": "...", "ttl": 120 }
    /// ```
    async fn present(&self, domain: &str, token: &str, key_auth: &str) -> Result<()> {
        let record = challenge::get_record(domain, key_auth);
        let zone_id = self.zone_id_for(&record.fqdn).await?;

        let payload = serde_json::json!({
            "type": "TXT",
            "name": challenge::un_fqdn(&record.fqdn),
            "content": record.value,
            "ttl": self.config.ttl,
        });

        let request = self
            .client
            .post(format!("{}/zones/{}/dns_records", self.base_url, zone_id))
            .json(&payload);
        let created: DnsRecord = self
            .send(self.authorize(request, Scope::Dns), "create record")
            .await?
            .ok_or_else(|| {
                Error::provider(PROVIDER_NAME, "create record: response has no result")
            })?;

        tracing::info!(
            record = %record.fqdn,
            record_id = %created.id,
            "Created challenge TXT record"
        );

        self.records.lock().await.insert(
            token.to_string(),
            CreatedRecord {
                zone_id,
                record_id: created.id,
            },
        );
        Ok(())
    }

    /// Delete the challenge TXT record created by `present`
    ///
    /// ```http
    /// DELETE /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn cleanup(&self, domain: &str, token: &str, key_auth: &str) -> Result<()> {
        let record = challenge::get_record(domain, key_auth);

        let created = self
            .records
            .lock()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| {
                Error::provider(
                    PROVIDER_NAME,
                    format!("unknown record ID for '{}'", record.fqdn),
                )
            })?;

        let request = self.client.delete(format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, created.zone_id, created.record_id
        ));
        self.send::<serde_json::Value>(self.authorize(request, Scope::Dns), "delete record")
            .await?;

        tracing::info!(
            record = %record.fqdn,
            record_id = %created.record_id,
            "Deleted challenge TXT record"
        );

        self.records.lock().await.remove(token);
        Ok(())
    }

    fn timeout(&self) -> (Duration, Duration) {
        (self.config.propagation_timeout, self.config.polling_interval)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
