//! Provider chain orchestrator
//!
//! Tries candidate providers in order until one returns audio, consulting
//! each provider's circuit breaker first and recording the outcome after.
//! At most one provider's synthesis value is ever returned; everything that
//! was tried before the winner is accounted for in the attempt records.

use crate::adapters::providers::routing::circuit_breaker::CircuitStatus;
use crate::adapters::providers::routing::registry::{ProviderRegistry, RegisteredProvider};
use crate::domain::error::{Error, Result};
use crate::domain::ports::Clock;
use crate::domain::types::{
    AttemptRecord, ProviderAvailability, ProviderInfo, SynthesisRequest, SynthesisResult,
};
use crate::domain::validation::validate_request;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Point-in-time view of one chain entry for diagnostics
#[derive(Debug, Clone)]
pub struct ProviderStatusSnapshot {
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    pub circuit_status: CircuitStatus,
    pub open_until: Option<Instant>,
    pub consecutive_failures: u32,
}

/// Orchestrator over an ordered list of providers with per-provider breakers
pub struct ProviderChain {
    registry: ProviderRegistry,
    clock: Arc<dyn Clock>,
}

impl ProviderChain {
    pub fn new(registry: ProviderRegistry, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Synthesize the request through the first provider that produces audio
    ///
    /// Returns `Err` only for validation failures and cancellation; provider
    /// failures are handled by falling through to the next candidate and
    /// surface as a composite failure result when every candidate fails.
    #[instrument(skip_all, fields(agent = ?request.agent_name))]
    pub async fn synthesize(
        &self,
        request: SynthesisRequest,
        cancel: &CancellationToken,
    ) -> Result<SynthesisResult> {
        validate_request(&request)?;

        let candidates = self.candidates(&request);
        if candidates.is_empty() {
            warn!("No providers available for synthesis");
            return Ok(SynthesisResult {
                success: false,
                audio: None,
                provider_used: None,
                generation_time: Duration::ZERO,
                audio_duration: None,
                error_message: Some(Error::NoProvidersAvailable.to_string()),
                attempts: Vec::new(),
            });
        }
        debug!(
            order = ?candidates.iter().map(|c| c.name()).collect::<Vec<_>>(),
            "Resolved candidate order"
        );

        let mut attempts: Vec<AttemptRecord> = Vec::new();

        for entry in &candidates {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if entry.breaker().status() == CircuitStatus::Open {
                debug!(provider = entry.name(), "Skipping provider, circuit open");
                attempts.push(AttemptRecord {
                    provider_name: entry.name().to_string(),
                    error_message: "circuit open".to_string(),
                    duration: Duration::ZERO,
                });
                continue;
            }

            let started = self.clock.now();
            match entry.provider().synthesize(&request, cancel).await {
                Ok(result) if result.success && result.audio.is_some() => {
                    entry.breaker().record_success();
                    if !attempts.is_empty() {
                        info!(
                            provider = entry.name(),
                            attempts = attempts.len(),
                            "Synthesis succeeded after fallback"
                        );
                    }
                    let mut result = result;
                    if result.provider_used.is_none() {
                        result.provider_used = Some(entry.name().to_string());
                    }
                    result.attempts = attempts;
                    return Ok(result);
                }
                Ok(result) => {
                    // A "successful" call without audio is still a failure
                    entry.breaker().record_failure();
                    let elapsed = self.clock.now().saturating_duration_since(started);
                    let message = result
                        .error_message
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "no audio".to_string());
                    warn!(provider = entry.name(), error = %message, "Provider failed");
                    attempts.push(AttemptRecord {
                        provider_name: entry.name().to_string(),
                        error_message: message,
                        duration: elapsed,
                    });
                }
                Err(err) if err.is_cancelled() => {
                    // Cancellations are not provider faults; no breaker update
                    return Err(Error::Cancelled);
                }
                Err(err) => {
                    entry.breaker().record_failure();
                    let elapsed = self.clock.now().saturating_duration_since(started);
                    warn!(provider = entry.name(), error = %err, "Provider raised a fault");
                    attempts.push(AttemptRecord {
                        provider_name: entry.name().to_string(),
                        error_message: err.to_string(),
                        duration: elapsed,
                    });
                }
            }
        }

        let generation_time = attempts.iter().map(|a| a.duration).sum();
        warn!(
            providers = candidates.len(),
            "All providers failed to synthesize"
        );
        Ok(SynthesisResult {
            success: false,
            audio: None,
            provider_used: None,
            generation_time,
            audio_duration: None,
            error_message: Some(format!("All {} providers failed", candidates.len())),
            attempts,
        })
    }

    /// Snapshot of every registered provider's chain state
    ///
    /// Safe for concurrent callers; each breaker is read under its own lock.
    pub fn providers_status(&self) -> Vec<ProviderStatusSnapshot> {
        self.registry
            .all()
            .iter()
            .map(|entry| {
                let breaker = entry.breaker().snapshot();
                ProviderStatusSnapshot {
                    name: entry.name().to_string(),
                    priority: entry.priority(),
                    enabled: entry.enabled(),
                    circuit_status: breaker.status,
                    open_until: breaker.open_until,
                    consecutive_failures: breaker.consecutive_failures,
                }
            })
            .collect()
    }

    /// Aggregate the providers' own diagnostics
    pub async fn providers_info(&self) -> Vec<ProviderInfo> {
        let mut infos = Vec::with_capacity(self.registry.len());
        for entry in self.registry.all() {
            let mut info = entry.provider().info().await;
            if !entry.enabled() {
                info.status = ProviderAvailability::Disabled;
            }
            infos.push(info);
        }
        infos
    }

    /// Resolve the ordered candidate list for one request
    ///
    /// A non-empty fallback chain overrides the default priority order;
    /// unknown or disabled names in it are skipped without becoming
    /// attempts. The preferred provider, when it matches, is hoisted to the
    /// front for this call only.
    fn candidates(&self, request: &SynthesisRequest) -> Vec<Arc<RegisteredProvider>> {
        let mut list = if request.fallback_chain.is_empty() {
            self.registry.ordered()
        } else {
            let filtered: Vec<_> = request
                .fallback_chain
                .iter()
                .filter_map(|name| match self.registry.get(name) {
                    Some(entry) if entry.enabled() => Some(entry),
                    Some(_) => {
                        warn!(provider = %name, "Fallback chain names a disabled provider, skipping");
                        None
                    }
                    None => {
                        warn!(provider = %name, "Fallback chain names an unknown provider, skipping");
                        None
                    }
                })
                .collect();
            if filtered.is_empty() {
                warn!("Fallback chain filtered to nothing, using default order");
                self.registry.ordered()
            } else {
                filtered
            }
        };

        if let Some(preferred) = request
            .preferred_provider
            .as_deref()
            .filter(|p| !p.is_empty())
        {
            match list
                .iter()
                .position(|entry| entry.name().eq_ignore_ascii_case(preferred))
            {
                Some(position) => {
                    if position > 0 {
                        let entry = list.remove(position);
                        list.insert(0, entry);
                    }
                }
                None => {
                    warn!(provider = %preferred, "Preferred provider is not a candidate, keeping order");
                }
            }
        }

        list
    }
}
