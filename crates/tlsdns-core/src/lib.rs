// # tlsdns-core
//
// Core library for the ACME DNS-01 provider adapters.
//
// ## Architecture Overview
//
// Every provider crate is a thin adapter: it deserializes its JSON
// configuration, merges the explicitly set fields onto its provider
// library's default configuration and hands that to a single constructor.
// This crate holds what the adapters share:
//
// - **CommonConfig**: base URL, TTL, propagation timeout, polling interval
//   and HTTP client customizations, merged with the "non-zero overrides
//   default" rule
// - **HttpClientConfig**: layered client → transport → dialer builder with
//   read-only default constants
// - **ChallengeProvider**: trait implemented by every challenge solver
// - **SolverRegistry**: explicit module ID → factory map the host populates
//   at startup
// - **challenge**: DNS-01 record name/value helpers
//
// ## Design Principles
//
// 1. **Zero means default**: an unset (zero/empty) field never overwrites a
//    library default. A legitimately-zero value (e.g. TTL=0) cannot be
//    expressed.
// 2. **No local validation**: values are passed through as-is; the provider
//    library decides what is acceptable.
// 3. **No retries**: errors surface exactly as the provider library reports
//    them.

pub mod challenge;
pub mod common;
pub mod duration;
pub mod env;
pub mod error;
pub mod httpclient;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use common::CommonConfig;
pub use duration::Duration;
pub use error::{Error, Result};
pub use httpclient::{DialerConfig, HttpClientConfig, TransportConfig};
pub use registry::SolverRegistry;
pub use traits::{ChallengeProvider, ChallengeProviderFactory, DnsProviderMaker, JsonFactory};
