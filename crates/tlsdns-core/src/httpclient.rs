//! Layered HTTP client configuration
//!
//! Three optional tiers, client → transport → dialer. Each tier that is
//! absent falls back to its default constant, and inside a tier every zero
//! field falls back independently to the matching default field.
//!
//! ```json
//! {
//!   "http_client": {
//!     "timeout": "30s",
//!     "transport": {
//!       "dialer": { "timeout": "5s", "keep_alive": "30s" },
//!       "max_idle_conns": 10,
//!       "idle_conn_timeout": "90s",
//!       "tls_handshake_timeout": "10s",
//!       "expect_continue_timeout": "1s"
//!     }
//!   }
//! }
//! ```

use crate::duration::Duration;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default dialer settings
pub const DEFAULT_DIALER_CONFIG: DialerConfig = DialerConfig {
    timeout: Duration::from_secs(30),
    keep_alive: Duration::from_secs(30),
};

/// Default transport settings
pub const DEFAULT_TRANSPORT_CONFIG: TransportConfig = TransportConfig {
    dialer: Some(DEFAULT_DIALER_CONFIG),
    max_idle_conns: 100,
    idle_conn_timeout: Duration::from_secs(90),
    tls_handshake_timeout: Duration::from_secs(10),
    expect_continue_timeout: Duration::from_secs(1),
};

/// HTTP client customizations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Transport settings; defaults apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportConfig>,

    /// Overall request timeout; zero means no timeout
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub timeout: Duration,
}

/// HTTP transport customizations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Dialer settings; defaults apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialer: Option<DialerConfig>,

    /// Maximum idle connections kept in the pool
    ///
    /// reqwest only has a per-host limit, so this becomes
    /// `pool_max_idle_per_host`. Each provider talks to a single API host,
    /// where the two limits coincide. A negative value keeps no idle
    /// connections at all.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_idle_conns: i64,

    /// How long an idle connection stays in the pool
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub idle_conn_timeout: Duration,

    /// Maximum time for the TLS handshake
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub tls_handshake_timeout: Duration,

    /// Maximum wait for a `100 Continue` response
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub expect_continue_timeout: Duration,
}

/// Network dialer customizations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialerConfig {
    /// Connect timeout
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub timeout: Duration,

    /// TCP keep-alive period
    #[serde(default, skip_serializing_if = "Duration::is_zero")]
    pub keep_alive: Duration,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Effective dialer settings after default fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialerSettings {
    pub timeout: std::time::Duration,
    pub keep_alive: std::time::Duration,
}

/// Effective transport settings after default fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub dialer: DialerSettings,
    pub max_idle_conns: i64,
    pub idle_conn_timeout: std::time::Duration,
    pub tls_handshake_timeout: std::time::Duration,
    /// Resolved for completeness; reqwest never sends `Expect: 100-continue`
    pub expect_continue_timeout: std::time::Duration,
}

impl TransportSettings {
    /// Idle connections reqwest may keep per host; negative counts disable pooling
    pub fn pool_max_idle_per_host(&self) -> usize {
        usize::try_from(self.max_idle_conns).unwrap_or(0)
    }
}

/// Effective client settings after default fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub transport: TransportSettings,
    /// `None` when no overall timeout was configured
    pub timeout: Option<std::time::Duration>,
}

fn or_default(value: Duration, default: Duration) -> std::time::Duration {
    if value.is_zero() {
        default.as_std()
    } else {
        value.as_std()
    }
}

impl DialerConfig {
    /// Resolve the dialer settings, falling back per field
    pub fn resolve(&self) -> DialerSettings {
        DialerSettings {
            timeout: or_default(self.timeout, DEFAULT_DIALER_CONFIG.timeout),
            keep_alive: or_default(self.keep_alive, DEFAULT_DIALER_CONFIG.keep_alive),
        }
    }
}

impl TransportConfig {
    /// Resolve the transport settings, falling back per field
    pub fn resolve(&self) -> TransportSettings {
        let dialer = self.dialer.unwrap_or(DEFAULT_DIALER_CONFIG).resolve();
        let max_idle_conns = if self.max_idle_conns == 0 {
            DEFAULT_TRANSPORT_CONFIG.max_idle_conns
        } else {
            self.max_idle_conns
        };

        TransportSettings {
            dialer,
            max_idle_conns,
            idle_conn_timeout: or_default(
                self.idle_conn_timeout,
                DEFAULT_TRANSPORT_CONFIG.idle_conn_timeout,
            ),
            tls_handshake_timeout: or_default(
                self.tls_handshake_timeout,
                DEFAULT_TRANSPORT_CONFIG.tls_handshake_timeout,
            ),
            expect_continue_timeout: or_default(
                self.expect_continue_timeout,
                DEFAULT_TRANSPORT_CONFIG.expect_continue_timeout,
            ),
        }
    }
}

impl HttpClientConfig {
    /// Resolve the full client settings
    pub fn resolve(&self) -> ClientSettings {
        let transport = self
            .transport
            .as_ref()
            .unwrap_or(&DEFAULT_TRANSPORT_CONFIG)
            .resolve();

        ClientSettings {
            transport,
            timeout: (!self.timeout.is_zero()).then(|| self.timeout.as_std()),
        }
    }

    /// Build an HTTP client from this configuration
    ///
    /// Proxies come from the environment (`HTTP_PROXY`, `HTTPS_PROXY`,
    /// `NO_PROXY`) and HTTP/2 is negotiated through ALPN. Every call returns
    /// an independent client.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        self.resolve().build()
    }
}

impl ClientSettings {
    /// Build a reqwest client with these settings
    pub fn build(&self) -> Result<reqwest::Client> {
        let transport = &self.transport;
        // reqwest's connect phase covers both the TCP dial and the TLS handshake
        let connect_timeout = transport.dialer.timeout + transport.tls_handshake_timeout;
        let max_idle = transport.pool_max_idle_per_host();

        let mut builder = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .tcp_keepalive(transport.dialer.keep_alive)
            .pool_max_idle_per_host(max_idle)
            .pool_idle_timeout(transport.idle_conn_timeout);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(
            connect_timeout = ?connect_timeout,
            idle_timeout = ?transport.idle_conn_timeout,
            max_idle,
            timeout = ?self.timeout,
            "Building HTTP client"
        );

        builder
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))
    }
}
