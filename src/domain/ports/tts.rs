use crate::domain::error::Result;
use crate::domain::types::{ProviderInfo, SynthesisRequest, SynthesisResult};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Contract every synthesis backend adapter satisfies
///
/// Expected failures (network error, auth error, backend refusal) are
/// returned as `Ok(SynthesisResult { success: false, .. })` with
/// `provider_used` set to the adapter's name and a non-empty error message.
/// `Err` is reserved for exceptional faults, which the chain records as
/// failures, and for `Error::Cancelled`, which it propagates untouched.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Stable identifier, case-insensitively unique across a registry
    fn name(&self) -> &str;

    /// Synthesize the request, honoring the cancellation token promptly
    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        cancel: &CancellationToken,
    ) -> Result<SynthesisResult>;

    /// Self-reported availability diagnostics
    async fn info(&self) -> ProviderInfo;
}
