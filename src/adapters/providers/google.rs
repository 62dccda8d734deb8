pub mod client;
pub mod key_pool;

pub use client::{GoogleTtsClient, HttpSynthesisTransport, SynthesisTransport, TransportResponse};
pub use key_pool::{ApiKey, KeyCooldowns, KeyPool, KeySnapshot, KeyStatus};
