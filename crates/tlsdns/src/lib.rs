// # tlsdns
//
// One entry point for the host: every provider module compiled in (per
// Cargo feature) is registered into a `SolverRegistry` under its
// `tls.dns.<name>` ID.
//
// ```rust,ignore
// let registry = tlsdns::default_registry()?;
// let provider = registry.create_solver("tls.dns.rfc2136", config_json)?;
// provider.present(domain, token, key_auth).await?;
// ```
//
// ## Features
//
// - `cloudflare` (default): `tls.dns.cloudflare`
// - `dnsimple` (default): `tls.dns.dnsimple`
// - `rfc2136` (default): `tls.dns.rfc2136`

pub use tlsdns_core::{
    ChallengeProvider, CommonConfig, Duration, Error, HttpClientConfig, Result, SolverRegistry,
};

#[cfg(feature = "cloudflare")]
pub use tlsdns_cloudflare as cloudflare;
#[cfg(feature = "dnsimple")]
pub use tlsdns_dnsimple as dnsimple;
#[cfg(feature = "rfc2136")]
pub use tlsdns_rfc2136 as rfc2136;

/// Register every enabled provider module
///
/// # Errors
///
/// Fails if one of the modules is already registered.
pub fn register_all(registry: &SolverRegistry) -> Result<()> {
    #[cfg(feature = "cloudflare")]
    {
        tracing::info!("Registering Cloudflare provider");
        tlsdns_cloudflare::register(registry)?;
    }

    #[cfg(feature = "dnsimple")]
    {
        tracing::info!("Registering DNSimple provider");
        tlsdns_dnsimple::register(registry)?;
    }

    #[cfg(feature = "rfc2136")]
    {
        tracing::info!("Registering RFC 2136 provider");
        tlsdns_rfc2136::register(registry)?;
    }

    Ok(())
}

/// A new registry holding every enabled provider module
pub fn default_registry() -> Result<SolverRegistry> {
    let registry = SolverRegistry::new();
    register_all(&registry)?;
    Ok(registry)
}
