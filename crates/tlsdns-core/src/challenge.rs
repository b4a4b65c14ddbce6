//! DNS-01 challenge helpers
//!
//! The TXT record for a DNS-01 challenge lives at
//! `_acme-challenge.<domain>.` and holds the base64url (no padding) encoded
//! SHA-256 digest of the key authorization.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Label prepended to the domain for challenge records
pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

/// Default TTL of challenge records, in seconds
pub const DEFAULT_TTL: i64 = 120;

/// Default maximum wait for DNS propagation
pub const DEFAULT_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default time between propagation checks
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(2);

/// The TXT record a solver must publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRecord {
    /// Fully-qualified record name, with trailing dot
    pub fqdn: String,
    /// Record content
    pub value: String,
}

/// Compute the challenge record for `domain` and a key authorization
pub fn get_record(domain: &str, key_auth: &str) -> ChallengeRecord {
    let domain = domain.strip_prefix("*.").unwrap_or(domain);
    let domain = domain.trim_end_matches('.');

    ChallengeRecord {
        fqdn: format!("{ACME_CHALLENGE_LABEL}.{domain}."),
        value: challenge_value(key_auth),
    }
}

/// base64url(SHA-256(key_auth)) without padding
pub fn challenge_value(key_auth: &str) -> String {
    let digest = Sha256::digest(key_auth.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Append the trailing dot if missing
pub fn to_fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Strip the trailing dot if present
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// The name and each of its parents, longest first, without the root
///
/// `_acme-challenge.www.example.com.` yields
/// `_acme-challenge.www.example.com`, `www.example.com`, `example.com`,
/// `com`.
pub fn candidate_zones(fqdn: &str) -> Vec<&str> {
    let name = un_fqdn(fqdn);
    let mut candidates = Vec::new();
    let mut rest = name;
    while !rest.is_empty() {
        candidates.push(rest);
        rest = match rest.split_once('.') {
            Some((_, parent)) => parent,
            None => "",
        };
    }
    candidates
}

/// Record name relative to its zone
///
/// `_acme-challenge.www.example.com.` in zone `example.com` is
/// `_acme-challenge.www`. A name outside the zone is returned unchanged.
pub fn relative_name<'a>(fqdn: &'a str, zone: &str) -> &'a str {
    let name = un_fqdn(fqdn);
    let zone = un_fqdn(zone);
    match name.strip_suffix(zone) {
        Some(prefix) if prefix.ends_with('.') => &prefix[..prefix.len() - 1],
        _ => name,
    }
}
