//! Environment overlay for provider library defaults
//!
//! Provider libraries start from built-in defaults and let the process
//! environment replace them (`CLOUDFLARE_TTL=300`, ...). Lookups go through
//! [`Lookup`] so tests can supply a fixed map instead of the real
//! environment. Duration variables are integer seconds.

use std::collections::HashMap;
use std::time::Duration;

/// Source of configuration variables
pub trait Lookup {
    /// Return the value of `key`, if set and non-empty
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl Lookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).filter(|v| !v.is_empty()).cloned()
    }
}

/// First set variable among `keys`
pub fn get_one_with_fallback(env: &impl Lookup, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env.get(key))
}

/// String variable, or `default` when unset
pub fn get_or_default_string(env: &impl Lookup, key: &str, default: &str) -> String {
    env.get(key).unwrap_or_else(|| default.to_string())
}

/// Integer variable, or `default` when unset or unparsable
pub fn get_or_default_int(env: &impl Lookup, key: &str, default: i64) -> i64 {
    match env.get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, "ignoring non-integer environment value");
            default
        }),
        None => default,
    }
}

/// Duration variable in whole seconds, or `default` when unset or unparsable
pub fn get_or_default_second(env: &impl Lookup, key: &str, default: Duration) -> Duration {
    match env.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .unwrap_or_else(|_| {
                tracing::warn!(key, "ignoring non-integer environment value");
                default
            }),
        None => default,
    }
}
