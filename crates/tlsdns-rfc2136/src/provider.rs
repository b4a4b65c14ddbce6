//! RFC 2136 DNS-01 provider library
//!
//! Publishes the challenge record with dynamic UPDATE messages sent to one
//! nameserver, TSIG-signed when a key is configured.

use crate::tsig::TsigSigner;
use crate::update::{self, Action};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolveHosts, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::ProtoErrorKind;
use hickory_resolver::proto::op::{MessageFinalizer, ResponseCode};
use hickory_resolver::proto::rr::{Name, RecordType};
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tlsdns_core::challenge::{
    self, DEFAULT_POLLING_INTERVAL, DEFAULT_PROPAGATION_TIMEOUT, DEFAULT_TTL,
};
use tlsdns_core::common::ProviderSettings;
use tlsdns_core::env::{self, Lookup, ProcessEnv};
use tlsdns_core::{ChallengeProvider, Error, Result};

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "rfc2136";

/// Algorithm used when none is configured
pub const DEFAULT_TSIG_ALGORITHM: &str = "hmac-md5.sig-alg.reg.int.";

/// Pause between two challenges handled by this provider
pub const DEFAULT_SEQUENCE_INTERVAL: Duration = Duration::from_secs(60);

/// Bound on each query, update and address lookup
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(10);

/// Library configuration for the RFC 2136 provider
#[derive(Clone)]
pub struct Config {
    /// `host` or `host:port`
    pub nameserver: String,
    pub tsig_algorithm: String,
    pub tsig_key: String,
    /// Base64 secret; ⚠️ NEVER log this value
    pub tsig_secret: String,
    pub ttl: i64,
    pub propagation_timeout: Duration,
    pub polling_interval: Duration,
    pub sequence_interval: Duration,
    pub dns_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("nameserver", &self.nameserver)
            .field("tsig_algorithm", &self.tsig_algorithm)
            .field("tsig_key", &self.tsig_key)
            .field("tsig_secret", &"<REDACTED>")
            .field("ttl", &self.ttl)
            .field("propagation_timeout", &self.propagation_timeout)
            .field("polling_interval", &self.polling_interval)
            .field("sequence_interval", &self.sequence_interval)
            .field("dns_timeout", &self.dns_timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nameserver: String::new(),
            tsig_algorithm: DEFAULT_TSIG_ALGORITHM.to_string(),
            tsig_key: String::new(),
            tsig_secret: String::new(),
            ttl: DEFAULT_TTL,
            propagation_timeout: DEFAULT_PROPAGATION_TIMEOUT,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            sequence_interval: DEFAULT_SEQUENCE_INTERVAL,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
        }
    }
}

impl Config {
    /// Built-in defaults overlaid with variables from `vars`
    pub fn from_lookup(vars: &impl Lookup) -> Self {
        let defaults = Self::default();
        Self {
            nameserver: env::get_or_default_string(vars, "RFC2136_NAMESERVER", ""),
            tsig_algorithm: env::get_or_default_string(
                vars,
                "RFC2136_TSIG_ALGORITHM",
                &defaults.tsig_algorithm,
            ),
            tsig_key: env::get_or_default_string(vars, "RFC2136_TSIG_KEY", ""),
            tsig_secret: env::get_or_default_string(vars, "RFC2136_TSIG_SECRET", ""),
            ttl: env::get_or_default_int(vars, "RFC2136_TTL", defaults.ttl),
            propagation_timeout: env::get_or_default_second(
                vars,
                "RFC2136_PROPAGATION_TIMEOUT",
                defaults.propagation_timeout,
            ),
            polling_interval: env::get_or_default_second(
                vars,
                "RFC2136_POLLING_INTERVAL",
                defaults.polling_interval,
            ),
            sequence_interval: env::get_or_default_second(
                vars,
                "RFC2136_SEQUENCE_INTERVAL",
                defaults.sequence_interval,
            ),
            dns_timeout: env::get_or_default_second(
                vars,
                "RFC2136_DNS_TIMEOUT",
                defaults.dns_timeout,
            ),
        }
    }
}

/// Default configuration: built-in defaults overlaid with the environment
pub fn new_default_config() -> Config {
    Config::from_lookup(&ProcessEnv)
}

impl ProviderSettings for Config {
    fn set_ttl(&mut self, ttl: i64) {
        self.ttl = ttl;
    }

    fn set_propagation_timeout(&mut self, timeout: Duration) {
        self.propagation_timeout = timeout;
    }

    fn set_polling_interval(&mut self, interval: Duration) {
        self.polling_interval = interval;
    }
}

/// Append the default port 53 when `nameserver` has none
///
/// Bare IPv6 addresses are bracketed.
fn with_default_port(nameserver: &str) -> Result<String> {
    if let Some(rest) = nameserver.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((_, "")) => Ok(format!("{nameserver}:53")),
            Some((_, port)) if port.starts_with(':') && port.len() > 1 => {
                Ok(nameserver.to_string())
            }
            _ => Err(Error::provider(
                PROVIDER_NAME,
                format!("address {nameserver}: invalid nameserver address"),
            )),
        };
    }

    match nameserver.matches(':').count() {
        0 => Ok(format!("{nameserver}:53")),
        1 => Ok(nameserver.to_string()),
        _ => Ok(format!("[{nameserver}]:53")),
    }
}

/// Build an RFC 2136 challenge provider from a library configuration
///
/// # Errors
///
/// - `rfc2136: nameserver missing`
/// - a bracketed nameserver address that is not closed
///
/// A key without a secret (or the reverse) disables TSIG. The TSIG
/// algorithm and secret are checked when an update is signed.
pub fn new_dns_provider_config(mut config: Config) -> Result<Rfc2136Provider> {
    if config.nameserver.is_empty() {
        return Err(Error::provider(PROVIDER_NAME, "nameserver missing"));
    }

    if config.tsig_algorithm.is_empty() {
        config.tsig_algorithm = DEFAULT_TSIG_ALGORITHM.to_string();
    }

    config.nameserver = with_default_port(&config.nameserver)?;

    if config.tsig_key.is_empty() || config.tsig_secret.is_empty() {
        config.tsig_key.clear();
        config.tsig_secret.clear();
    }

    tracing::debug!(
        nameserver = %config.nameserver,
        tsig = !config.tsig_key.is_empty(),
        "Created RFC 2136 provider"
    );

    Ok(Rfc2136Provider { config })
}

/// Message of a DNS error without the variant prefix
fn detail(err: Error) -> String {
    match err {
        Error::Dns(message) => message,
        other => other.to_string(),
    }
}

/// Wire name of a response code, e.g. `SERVFAIL`
fn rcode_name(code: ResponseCode) -> String {
    match code {
        ResponseCode::NoError => "NOERROR".to_string(),
        ResponseCode::FormErr => "FORMERR".to_string(),
        ResponseCode::ServFail => "SERVFAIL".to_string(),
        ResponseCode::NXDomain => "NXDOMAIN".to_string(),
        ResponseCode::NotImp => "NOTIMP".to_string(),
        ResponseCode::Refused => "REFUSED".to_string(),
        ResponseCode::YXDomain => "YXDOMAIN".to_string(),
        ResponseCode::YXRRSet => "YXRRSET".to_string(),
        ResponseCode::NXRRSet => "NXRRSET".to_string(),
        ResponseCode::NotAuth => "NOTAUTH".to_string(),
        ResponseCode::NotZone => "NOTZONE".to_string(),
        other => u16::from(other).to_string(),
    }
}

/// RFC 2136 challenge provider
#[derive(Debug)]
pub struct Rfc2136Provider {
    config: Config,
}

impl Rfc2136Provider {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the configured `host:port` to a socket address
    async fn nameserver_addr(&self) -> Result<SocketAddr> {
        let nameserver = &self.config.nameserver;
        let mut addrs = tokio::time::timeout(
            self.config.dns_timeout,
            tokio::net::lookup_host(nameserver.as_str()),
        )
        .await
        .map_err(|_| Error::dns(format!("timed out resolving {nameserver}")))?
        .map_err(|e| Error::dns(format!("failed to resolve {nameserver}: {e}")))?;

        addrs
            .next()
            .ok_or_else(|| Error::dns(format!("no address found for {nameserver}")))
    }

    /// Signer for outgoing updates, when a TSIG key is configured
    fn signer(&self) -> Result<Option<Arc<dyn MessageFinalizer>>> {
        if self.config.tsig_key.is_empty() {
            return Ok(None);
        }

        let signer = TsigSigner::new(
            &self.config.tsig_key,
            &self.config.tsig_algorithm,
            &self.config.tsig_secret,
        )
        .map_err(Error::dns)?;
        Ok(Some(Arc::new(signer)))
    }

    /// Resolver that sends every query to the configured nameserver only
    fn resolver(&self, server: SocketAddr) -> TokioResolver {
        let mut resolver_config = ResolverConfig::new();
        resolver_config.add_name_server(NameServerConfig::new(server, Protocol::Udp));

        let mut opts = ResolverOpts::default();
        opts.timeout = self.config.dns_timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.use_hosts_file = ResolveHosts::Never;
        opts.preserve_intermediates = true;

        Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
            .with_options(opts)
            .build()
    }

    /// Find the zone holding `fqdn` with SOA queries to the nameserver
    ///
    /// The first candidate answered with an SOA record owned by itself is
    /// the zone. Answers containing a CNAME are skipped, NXDOMAIN and empty
    /// answers move on to the parent, and any other response code is an
    /// error.
    async fn find_zone(&self, resolver: &TokioResolver, fqdn: &str) -> Result<Name> {
        let mut last_error = None;

        for candidate in challenge::candidate_zones(fqdn) {
            let name = Name::from_ascii(challenge::to_fqdn(candidate))
                .map_err(|e| Error::dns(format!("invalid domain name {candidate}: {e}")))?;

            match resolver.lookup(name.clone(), RecordType::SOA).await {
                Ok(lookup) => {
                    let records = lookup.records();
                    if records.iter().any(|r| r.record_type() == RecordType::CNAME) {
                        continue;
                    }
                    if records
                        .iter()
                        .any(|r| r.record_type() == RecordType::SOA && r.name() == &name)
                    {
                        tracing::debug!(zone = %name, "Found zone");
                        return Ok(name);
                    }
                }
                Err(e) => match e.proto().map(|p| p.kind()) {
                    Some(ProtoErrorKind::NoRecordsFound { response_code, .. })
                        if matches!(
                            response_code,
                            ResponseCode::NoError | ResponseCode::NXDomain
                        ) => {}
                    Some(ProtoErrorKind::NoRecordsFound { response_code, .. }) => {
                        return Err(Error::dns(format!(
                            "unexpected response code '{}' for {}",
                            rcode_name(*response_code),
                            candidate
                        )));
                    }
                    _ => {
                        tracing::debug!(candidate, error = %e, "SOA query failed");
                        last_error = Some(e);
                    }
                },
            }
        }

        Err(Error::dns(match last_error {
            Some(e) => format!("could not find the start of authority for {fqdn}: {e}"),
            None => format!("could not find the start of authority for {fqdn}"),
        }))
    }

    async fn change_record(&self, action: Action, fqdn: &str, value: &str) -> Result<()> {
        let ttl = u32::try_from(self.config.ttl)
            .map_err(|_| Error::invalid_input(format!("invalid TTL {}", self.config.ttl)))?;
        let signer = self.signer()?;

        let server = self.nameserver_addr().await?;
        let zone = self.find_zone(&self.resolver(server), fqdn).await?;
        let owner = Name::from_ascii(fqdn)
            .map_err(|e| Error::dns(format!("invalid domain name {fqdn}: {e}")))?;

        let message = update::build(action, &zone, &owner, value, ttl);
        let response = update::send(server, message, signer, self.config.dns_timeout)
            .await
            .map_err(|e| Error::dns(format!("DNS update failed: {e}")))?;

        let rcode = response.response_code();
        if rcode != ResponseCode::NoError {
            return Err(Error::dns(format!(
                "DNS update failed: server replied: {}",
                rcode_name(rcode)
            )));
        }

        tracing::info!(record = fqdn, zone = %zone, ?action, "Applied dynamic update");
        Ok(())
    }
}

#[async_trait]
impl ChallengeProvider for Rfc2136Provider {
    async fn present(&self, domain: &str, _token: &str, key_auth: &str) -> Result<()> {
        let record = challenge::get_record(domain, key_auth);
        self.change_record(Action::Insert, &record.fqdn, &record.value)
            .await
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("failed to insert: {}", detail(e)))
            })
    }

    async fn cleanup(&self, domain: &str, _token: &str, key_auth: &str) -> Result<()> {
        let record = challenge::get_record(domain, key_auth);
        self.change_record(Action::Remove, &record.fqdn, &record.value)
            .await
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("failed to remove: {}", detail(e)))
            })
    }

    fn timeout(&self) -> (Duration, Duration) {
        (self.config.propagation_timeout, self.config.polling_interval)
    }

    fn sequential(&self) -> Option<Duration> {
        Some(self.config.sequence_interval)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
