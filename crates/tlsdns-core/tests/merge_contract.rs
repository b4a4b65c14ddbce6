//! Architectural Contract Test: Zero Means Default
//!
//! Constraints verified:
//! - A field left at its zero value never overwrites a library default
//! - Every explicitly set field reaches the library configuration unchanged
//! - HTTP client settings fall back level by level (client, transport,
//!   dialer) to the read-only defaults
//! - Building a client never mutates the shared default constants
//!
//! If this test fails, adapters silently change library behavior.

use std::time::Duration as StdDuration;
use tlsdns_core::common::ProviderSettings;
use tlsdns_core::httpclient::{DEFAULT_DIALER_CONFIG, DEFAULT_TRANSPORT_CONFIG};
use tlsdns_core::{CommonConfig, DialerConfig, Duration, HttpClientConfig, TransportConfig};

/// Library configuration with recognisable non-zero defaults
#[derive(Debug, Clone, PartialEq)]
struct LibraryConfig {
    base_url: String,
    ttl: i64,
    propagation_timeout: StdDuration,
    polling_interval: StdDuration,
    has_custom_client: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.example.net".to_string(),
            ttl: 3600,
            propagation_timeout: StdDuration::from_secs(120),
            polling_interval: StdDuration::from_secs(2),
            has_custom_client: false,
        }
    }
}

impl ProviderSettings for LibraryConfig {
    fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
    }
    fn set_ttl(&mut self, ttl: i64) {
        self.ttl = ttl;
    }
    fn set_propagation_timeout(&mut self, timeout: StdDuration) {
        self.propagation_timeout = timeout;
    }
    fn set_polling_interval(&mut self, interval: StdDuration) {
        self.polling_interval = interval;
    }
    fn set_http_client(&mut self, _client: reqwest::Client) {
        self.has_custom_client = true;
    }
}

fn merged(json: serde_json::Value) -> LibraryConfig {
    let common: CommonConfig = serde_json::from_value(json).expect("valid common config");
    let mut library = LibraryConfig::default();
    common.apply_to(&mut library).expect("merge succeeds");
    library
}

#[test]
fn empty_json_leaves_library_defaults() {
    assert_eq!(merged(serde_json::json!({})), LibraryConfig::default());
}

#[test]
fn explicit_zero_is_indistinguishable_from_unset() {
    // Known limitation: a TTL of 0 cannot be requested
    let library = merged(serde_json::json!({ "ttl": 0, "polling_interval": 0 }));
    assert_eq!(library, LibraryConfig::default());
}

#[test]
fn set_fields_override_only_themselves() {
    let library = merged(serde_json::json!({
        "ttl": 120,
        "propagation_timeout": "5m",
        "polling_interval": "10s"
    }));

    assert_eq!(library.ttl, 120);
    assert_eq!(library.propagation_timeout, StdDuration::from_secs(300));
    assert_eq!(library.polling_interval, StdDuration::from_secs(10));
    assert_eq!(library.base_url, LibraryConfig::default().base_url);
    assert!(!library.has_custom_client);
}

#[test]
fn http_client_block_builds_a_client() {
    let library = merged(serde_json::json!({ "http_client": {} }));
    assert!(library.has_custom_client);
}

#[test]
fn empty_http_client_resolves_to_defaults() {
    let settings = HttpClientConfig::default().resolve();

    assert_eq!(settings.timeout, None);
    assert_eq!(settings.transport, DEFAULT_TRANSPORT_CONFIG.resolve());
    assert_eq!(settings.transport.dialer.timeout, StdDuration::from_secs(30));
    assert_eq!(settings.transport.dialer.keep_alive, StdDuration::from_secs(30));
    assert_eq!(settings.transport.max_idle_conns, 100);
    assert_eq!(settings.transport.idle_conn_timeout, StdDuration::from_secs(90));
    assert_eq!(
        settings.transport.tls_handshake_timeout,
        StdDuration::from_secs(10)
    );
    assert_eq!(
        settings.transport.expect_continue_timeout,
        StdDuration::from_secs(1)
    );
}

#[test]
fn partial_dialer_falls_back_per_field() {
    let config = HttpClientConfig {
        transport: Some(TransportConfig {
            dialer: Some(DialerConfig {
                timeout: Duration::from_secs(5),
                keep_alive: Duration::ZERO,
            }),
            ..Default::default()
        }),
        timeout: Duration::from_secs(15),
    };

    let settings = config.resolve();
    assert_eq!(settings.timeout, Some(StdDuration::from_secs(15)));
    assert_eq!(settings.transport.dialer.timeout, StdDuration::from_secs(5));
    assert_eq!(
        settings.transport.dialer.keep_alive,
        DEFAULT_DIALER_CONFIG.keep_alive.as_std()
    );
    assert_eq!(settings.transport.max_idle_conns, 100);
}

#[test]
fn building_clients_leaves_defaults_untouched() {
    let before = (DEFAULT_TRANSPORT_CONFIG, DEFAULT_DIALER_CONFIG);

    let custom = HttpClientConfig {
        transport: Some(TransportConfig {
            max_idle_conns: 7,
            ..Default::default()
        }),
        timeout: Duration::from_secs(1),
    };
    custom.http_client().expect("client builds");
    HttpClientConfig::default()
        .http_client()
        .expect("client builds");

    assert_eq!((DEFAULT_TRANSPORT_CONFIG, DEFAULT_DIALER_CONFIG), before);
}
