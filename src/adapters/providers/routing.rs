pub mod chain;
pub mod circuit_breaker;
pub mod registry;

pub use chain::{ProviderChain, ProviderStatusSnapshot};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitStatus};
pub use registry::ProviderRegistry;
