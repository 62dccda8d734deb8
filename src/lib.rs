//! vox-relay - multi-provider text-to-speech orchestration
//!
//! The crate is organized around a provider chain: an ordered list of TTS
//! backends tried in turn until one produces audio, with an independent
//! circuit breaker per provider so that known-bad backends are skipped
//! cheaply and re-probed after a cooldown. The Google Cloud client rotates
//! among multiple API keys internally while looking like a single provider
//! to the chain.

pub mod adapters;
pub mod domain;
pub mod infrastructure;

// Re-export the orchestration surface
pub use adapters::providers::google::GoogleTtsClient;
pub use adapters::providers::routing::{
    chain::{ProviderChain, ProviderStatusSnapshot},
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitStatus},
    registry::ProviderRegistry,
};
pub use domain::error::{Error, Result};
pub use domain::ports::{Clock, TtsProvider};
pub use domain::types::{
    AttemptRecord, AudioData, AudioEncoding, ProviderAvailability, ProviderInfo, SynthesisRequest,
    SynthesisResult,
};
pub use infrastructure::clock::SystemClock;
