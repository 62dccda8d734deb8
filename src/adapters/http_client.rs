//! Shared HTTP client
//!
//! One pooled reqwest client per cloud backend, built with that backend's
//! configured request timeout. Handed around as `Arc<dyn HttpClientProvider>`
//! so ownership is explicit: the provider that builds the pool releases it,
//! while tests inject their own.

use crate::domain::error::{Error, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Access to a pooled HTTP client (DI seam)
pub trait HttpClientProvider: Send + Sync {
    fn client(&self) -> &Client;
}

/// Type alias for shared HTTP client provider
pub type SharedHttpClient = Arc<dyn HttpClientProvider>;

/// Pooled client with a fixed per-request timeout
///
/// Connection reuse is left to reqwest's defaults; the only knob a backend
/// configures is how long a synthesis call may take end to end.
pub struct HttpClientPool {
    client: Client,
    timeout: Duration,
}

impl HttpClientPool {
    /// Build a pool whose requests time out after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vox-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    /// The timeout every request through this pool is subject to
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpClientProvider for HttpClientPool {
    fn client(&self) -> &Client {
        &self.client
    }
}
