//! Configuration value objects
//!
//! The core consumes pre-populated configuration; loading it from files,
//! environment variables, or vaults is the host application's concern. All
//! types deserialize with serde and fall back to the defaults in
//! [`crate::infrastructure::constants`].

use crate::adapters::providers::routing::circuit_breaker::CircuitBreakerConfig;
use crate::domain::types::AudioEncoding;
use crate::infrastructure::constants::{
    DEFAULT_SAMPLE_RATE_HERTZ, HTTP_REQUEST_TIMEOUT, QUOTA_EXCEEDED_COOLDOWN, RATE_LIMIT_COOLDOWN,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// Orchestration configuration: the provider roster the chain is built from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

/// Static wiring for one provider in the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Registry name; matched case-insensitively
    pub name: String,
    /// Lower priority is tried earlier
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub breaker: CircuitBreakerConfig,
}

impl ProviderEntry {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: true,
            breaker: CircuitBreakerConfig::default(),
        }
    }

    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Symbolic reference to an API key secret
///
/// The secret value itself is looked up from a [`SecretMap`] at client
/// construction; the display name is what diagnostics show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeySecret {
    pub secret_key: String,
    pub display_name: String,
}

impl ApiKeySecret {
    pub fn new(secret_key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            display_name: display_name.into(),
        }
    }
}

/// Google Cloud TTS client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GoogleTtsConfig {
    #[serde(default)]
    pub api_key_secrets: Vec<ApiKeySecret>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub audio_encoding: AudioEncoding,
    /// Default speaking rate when the request does not adjust it
    #[serde(default = "default_speaking_rate")]
    #[validate(range(min = 0.25, max = 4.0))]
    pub speaking_rate: f64,
    /// Default pitch in semitones when the request does not adjust it
    #[serde(default)]
    #[validate(range(min = -20.0, max = 20.0))]
    pub pitch: f64,
    #[serde(default)]
    #[validate(range(min = -96.0, max = 16.0))]
    pub volume_gain_db: f64,
    #[serde(default = "default_sample_rate_hertz")]
    pub sample_rate_hertz: u32,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_rate_limit_cooldown")]
    pub rate_limit_cooldown: Duration,
    #[serde(default = "default_quota_exceeded_cooldown")]
    pub quota_exceeded_cooldown: Duration,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            api_key_secrets: Vec::new(),
            voice: default_voice(),
            audio_encoding: AudioEncoding::default(),
            speaking_rate: default_speaking_rate(),
            pitch: 0.0,
            volume_gain_db: 0.0,
            sample_rate_hertz: default_sample_rate_hertz(),
            timeout: default_timeout(),
            rate_limit_cooldown: default_rate_limit_cooldown(),
            quota_exceeded_cooldown: default_quota_exceeded_cooldown(),
        }
    }
}

/// Resolved secrets keyed by symbolic name
///
/// Populated by the host from whatever secret store it uses; the core only
/// ever reads from it.
#[derive(Debug, Clone, Default)]
pub struct SecretMap(HashMap<String, String>);

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SecretMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn default_enabled() -> bool {
    true
}

fn default_voice() -> String {
    "cs-CZ-Wavenet-A".to_string()
}

fn default_speaking_rate() -> f64 {
    1.0
}

fn default_sample_rate_hertz() -> u32 {
    DEFAULT_SAMPLE_RATE_HERTZ
}

fn default_timeout() -> Duration {
    HTTP_REQUEST_TIMEOUT
}

fn default_rate_limit_cooldown() -> Duration {
    RATE_LIMIT_COOLDOWN
}

fn default_quota_exceeded_cooldown() -> Duration {
    QUOTA_EXCEEDED_COOLDOWN
}
