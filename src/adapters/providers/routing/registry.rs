//! Provider registry
//!
//! Name-to-provider lookup built once at startup. Lookups are
//! case-insensitive; membership does not imply enabled status, which is
//! preserved on each entry and re-checked by the chain.

use crate::adapters::providers::routing::circuit_breaker::CircuitBreaker;
use crate::domain::error::{Error, Result};
use crate::domain::ports::{Clock, TtsProvider};
use crate::infrastructure::config::ProviderEntry;
use dashmap::DashMap;
use std::sync::Arc;

/// A provider together with its chain wiring and breaker state
pub struct RegisteredProvider {
    name: String,
    priority: i32,
    enabled: bool,
    provider: Arc<dyn TtsProvider>,
    breaker: CircuitBreaker,
}

impl RegisteredProvider {
    /// Canonical (configured) provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn provider(&self) -> &Arc<dyn TtsProvider> {
        &self.provider
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

/// Immutable-after-construction provider registry
pub struct ProviderRegistry {
    entries: Vec<Arc<RegisteredProvider>>,
    by_name: DashMap<String, Arc<RegisteredProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: DashMap::new(),
        }
    }

    /// Register a provider with its configured wiring
    ///
    /// The breaker is created here, in its initial Closed state, and lives
    /// for the registry's lifetime. Duplicate names (case-insensitive) are a
    /// configuration error.
    pub fn register(
        &mut self,
        entry: &ProviderEntry,
        provider: Arc<dyn TtsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<()> {
        let key = entry.name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(Error::config(format!(
                "Provider '{}' already registered",
                entry.name
            )));
        }

        let registered = Arc::new(RegisteredProvider {
            name: entry.name.clone(),
            priority: entry.priority,
            enabled: entry.enabled,
            provider,
            breaker: CircuitBreaker::new(entry.name.clone(), entry.breaker.clone(), clock),
        });
        self.by_name.insert(key, Arc::clone(&registered));
        self.entries.push(registered);
        Ok(())
    }

    /// Look up a provider by name, case-insensitively
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredProvider>> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// All registered providers in registration order
    pub fn all(&self) -> &[Arc<RegisteredProvider>] {
        &self.entries
    }

    /// Enabled providers in ascending priority order
    pub fn ordered(&self) -> Vec<Arc<RegisteredProvider>> {
        let mut enabled: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.enabled)
            .cloned()
            .collect();
        enabled.sort_by_key(|entry| entry.priority);
        enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
