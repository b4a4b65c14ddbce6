//! Module registry for challenge provider creation
//!
//! The host builds one registry at startup, registers each provider module
//! under its `tls.dns.<name>` identifier and later asks it to turn a
//! module's raw JSON configuration into a challenge provider.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tlsdns_core::registry::SolverRegistry;
//!
//! let registry = SolverRegistry::new();
//! registry.register::<tlsdns_cloudflare::Cloudflare>()?;
//!
//! let provider = registry.create_solver(
//!     "tls.dns.cloudflare",
//!     br#"{"api_token": "..."}"#,
//! )?;
//! ```
//!
//! ## Registration
//!
//! Provider crates expose a `register` function the host calls during
//! initialization:
//!
//! ```rust,ignore
//! // In tlsdns-cloudflare
//! pub fn register(registry: &SolverRegistry) -> Result<()> {
//!     registry.register::<Cloudflare>()
//! }
//! ```

use crate::error::{Error, Result};
use crate::traits::{ChallengeProvider, ChallengeProviderFactory, DnsProviderMaker, JsonFactory};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Namespace every DNS provider module ID lives under
pub const MODULE_NAMESPACE: &str = "tls.dns.";

/// Registry mapping module IDs to challenge provider factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct SolverRegistry {
    /// Registered factories, keyed by module ID
    modules: RwLock<HashMap<String, Box<dyn ChallengeProviderFactory>>>,
}

impl SolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a module ID
    ///
    /// # Parameters
    ///
    /// - `id`: Module ID (e.g., "tls.dns.cloudflare")
    /// - `factory`: Factory object for creating provider instances
    ///
    /// # Errors
    ///
    /// The ID must name a module inside the `tls.dns.` namespace and must
    /// not already be registered.
    pub fn register_module(
        &self,
        id: impl Into<String>,
        factory: Box<dyn ChallengeProviderFactory>,
    ) -> Result<()> {
        let id = id.into();
        let name = id.strip_prefix(MODULE_NAMESPACE).unwrap_or_default();
        if name.is_empty() || name.contains('.') {
            return Err(Error::config(format!(
                "module ID '{id}' must be of the form {MODULE_NAMESPACE}<provider-name>"
            )));
        }

        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        if modules.contains_key(&id) {
            return Err(Error::config(format!("module already registered: {id}")));
        }

        tracing::debug!(module = %id, "Registering DNS provider module");
        modules.insert(id, factory);
        Ok(())
    }

    /// Register an adapter configuration type under its `MODULE_ID`
    pub fn register<T>(&self) -> Result<()>
    where
        T: DnsProviderMaker + DeserializeOwned + Default + 'static,
    {
        self.register_module(T::MODULE_ID, Box::new(JsonFactory::<T>::new()))
    }

    /// Create a challenge provider from a module's JSON configuration
    ///
    /// # Parameters
    ///
    /// - `id`: Module ID
    /// - `config`: Raw JSON configuration of the module
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ChallengeProvider>)`: Created provider instance
    /// - `Err(Error)`: If the module is not registered, or exactly what the
    ///   module's factory returned
    pub fn create_solver(&self, id: &str, config: &[u8]) -> Result<Box<dyn ChallengeProvider>> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);

        let factory = modules
            .get(id)
            .ok_or_else(|| Error::config(format!("Unknown DNS provider module: {id}")))?;

        factory.create(config)
    }

    /// List all registered module IDs, sorted
    pub fn list_modules(&self) -> Vec<String> {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = modules.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Check if a module ID is registered
    pub fn has_module(&self, id: &str) -> bool {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        modules.contains_key(id)
    }
}
