//! Core traits for the DNS-01 provider adapters
//!
//! - [`ChallengeProvider`]: publish and remove DNS-01 challenge records
//! - [`DnsProviderMaker`]: adapter configuration that builds a provider
//! - [`ChallengeProviderFactory`]: build a provider from raw JSON config

pub mod challenge_provider;

pub use challenge_provider::{
    ChallengeProvider, ChallengeProviderFactory, DnsProviderMaker, JsonFactory,
};
