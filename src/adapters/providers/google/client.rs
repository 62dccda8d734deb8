//! Google Cloud TTS client
//!
//! Presents one provider to the chain while internally rotating among
//! multiple API keys for the same endpoint. The chain's breaker treats the
//! whole cloud service as one unit; the pool absorbs per-credential faults
//! that would otherwise exhaust the outer breaker prematurely.

use crate::adapters::http_client::{HttpClientPool, SharedHttpClient};
use crate::adapters::providers::google::key_pool::{ApiKey, KeyCooldowns, KeyPool, KeySnapshot};
use crate::adapters::providers::helpers;
use crate::domain::error::{Error, Result};
use crate::domain::ports::{Clock, TtsProvider};
use crate::domain::types::{
    AudioData, AudioEncoding, ProviderAvailability, ProviderInfo, SynthesisRequest,
    SynthesisResult,
};
use crate::infrastructure::config::{GoogleTtsConfig, SecretMap};
use crate::infrastructure::constants::GOOGLE_TTS_ENDPOINT;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const PROVIDER_NAME: &str = "google";

/// Raw response handed back by the transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Transport seam for the synthesis POST (enables DI and testing)
///
/// Cancellation must surface as `Error::Cancelled` without any side effect;
/// the client never touches key state for a cancelled dispatch.
#[async_trait]
pub trait SynthesisTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse>;
}

/// Production transport on the shared HTTP client pool
pub struct HttpSynthesisTransport {
    http: SharedHttpClient,
}

impl HttpSynthesisTransport {
    pub fn new(http: SharedHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SynthesisTransport for HttpSynthesisTransport {
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse> {
        let send = self
            .http
            .client()
            .post(url)
            .query(&[("key", api_key)])
            .json(body)
            .send();
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            response = send => {
                let response = response?;
                let status = response.status().as_u16();
                let body = response.text().await?;
                Ok(TransportResponse { status, body })
            }
        }
    }
}

/// Multi-key Google Cloud TTS provider
pub struct GoogleTtsClient {
    config: GoogleTtsConfig,
    keys: KeyPool,
    transport: Arc<dyn SynthesisTransport>,
    clock: Arc<dyn Clock>,
    last_success: Mutex<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for GoogleTtsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTtsClient")
            .field("config", &self.config)
            .field("last_success", &self.last_success)
            .finish_non_exhaustive()
    }
}

impl GoogleTtsClient {
    /// Create a client owning its HTTP transport
    ///
    /// Fails fatally when any configured secret name cannot be resolved;
    /// a chain wired with phantom credentials must not come up at all.
    pub fn new(config: GoogleTtsConfig, secrets: &SecretMap, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = Arc::new(HttpClientPool::with_timeout(config.timeout)?);
        let transport = Arc::new(HttpSynthesisTransport::new(http));
        Self::with_transport(config, secrets, transport, clock)
    }

    /// Create a client with an injected transport (tests)
    pub fn with_transport(
        config: GoogleTtsConfig,
        secrets: &SecretMap,
        transport: Arc<dyn SynthesisTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut keys = Vec::with_capacity(config.api_key_secrets.len());
        for (index, secret_ref) in config.api_key_secrets.iter().enumerate() {
            let value = secrets.get(&secret_ref.secret_key).ok_or_else(|| {
                Error::config(format!(
                    "API key secret '{}' could not be resolved",
                    secret_ref.secret_key
                ))
            })?;
            keys.push(ApiKey {
                index,
                display_name: secret_ref.display_name.clone(),
                secret: value.to_string(),
            });
        }

        let cooldowns = KeyCooldowns {
            rate_limited: config.rate_limit_cooldown,
            quota_exceeded: config.quota_exceeded_cooldown,
            ..KeyCooldowns::default()
        };

        Ok(Self {
            keys: KeyPool::new(keys, cooldowns, Arc::clone(&clock)),
            config,
            transport,
            clock,
            last_success: Mutex::new(None),
        })
    }

    /// Diagnostics view of the key pool
    pub fn key_snapshot(&self) -> Vec<KeySnapshot> {
        self.keys.snapshot()
    }

    fn request_body(&self, request: &SynthesisRequest) -> serde_json::Value {
        let voice = request
            .voice
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.config.voice);
        let speaking_rate = helpers::speaking_rate(request.rate, self.config.speaking_rate);
        let pitch = if request.pitch == 0 {
            self.config.pitch
        } else {
            helpers::pitch_semitones(request.pitch)
        };

        serde_json::json!({
            "input": { "text": request.text.trim() },
            "voice": {
                "languageCode": helpers::language_code(voice),
                "name": voice,
            },
            "audioConfig": {
                "audioEncoding": self.config.audio_encoding.as_str(),
                "speakingRate": speaking_rate,
                "pitch": pitch,
                "volumeGainDb": self.config.volume_gain_db,
                "sampleRateHertz": self.config.sample_rate_hertz,
            },
        })
    }

    /// PCM length is exact math; compressed encodings cannot be estimated
    /// without decoding, so they report no duration
    fn estimate_audio_duration(&self, byte_len: usize) -> Option<Duration> {
        match self.config.audio_encoding {
            AudioEncoding::Linear16 if self.config.sample_rate_hertz > 0 => {
                let seconds = byte_len as f64 / (f64::from(self.config.sample_rate_hertz) * 2.0);
                Some(Duration::from_secs_f64(seconds))
            }
            _ => None,
        }
    }

    fn decode_success(&self, body: &str, generation_time: Duration) -> SynthesisResult {
        let parsed: serde_json::Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(err) => {
                return SynthesisResult::failure(
                    PROVIDER_NAME,
                    format!("malformed synthesis response: {err}"),
                );
            }
        };

        let Some(audio_content) = parsed.get("audioContent").and_then(|v| v.as_str()) else {
            return SynthesisResult::failure(
                PROVIDER_NAME,
                "synthesis response missing audioContent",
            );
        };

        let bytes = match BASE64.decode(audio_content) {
            Ok(bytes) => bytes,
            Err(err) => {
                return SynthesisResult::failure(
                    PROVIDER_NAME,
                    format!("audioContent is not valid base64: {err}"),
                );
            }
        };

        *self.last_success.lock().expect("last success mutex poisoned") = Some(Utc::now());
        let audio_duration = self.estimate_audio_duration(bytes.len());
        let audio = AudioData::Memory {
            bytes,
            content_type: self.config.audio_encoding.content_type().to_string(),
        };
        SynthesisResult::success(PROVIDER_NAME, audio, generation_time)
            .with_audio_duration(audio_duration)
    }
}

#[async_trait]
impl TtsProvider for GoogleTtsClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn synthesize(
        &self,
        request: &SynthesisRequest,
        cancel: &CancellationToken,
    ) -> Result<SynthesisResult> {
        let started = self.clock.now();
        let body = self.request_body(request);

        // Bounded rotation: every configured key plus one revival slot
        for _ in 0..=self.keys.len() {
            let Some(key) = self.keys.next_available() else {
                break;
            };
            debug!(key = %key.display_name, "Dispatching synthesis request");

            let response = match self
                .transport
                .post(GOOGLE_TTS_ENDPOINT, &key.secret, &body, cancel)
                .await
            {
                Ok(response) => response,
                Err(err) if err.is_cancelled() => return Err(Error::Cancelled),
                Err(err) => {
                    warn!(key = %key.display_name, error = %err, "Transport fault, cooling key briefly");
                    self.keys.mark_temporary_error(key.index);
                    continue;
                }
            };

            match response.status {
                200 => {
                    let elapsed = self.clock.now().saturating_duration_since(started);
                    return Ok(self.decode_success(&response.body, elapsed));
                }
                429 => {
                    warn!(key = %key.display_name, "Rate limited, rotating key");
                    self.keys.mark_rate_limited(key.index);
                }
                403 => {
                    warn!(key = %key.display_name, "Quota exceeded, rotating key");
                    self.keys.mark_quota_exceeded(key.index);
                }
                401 => {
                    warn!(key = %key.display_name, "Unauthorized, retiring key");
                    self.keys.mark_invalid(key.index);
                }
                status => {
                    warn!(key = %key.display_name, status, "Backend error, cooling key briefly");
                    self.keys.mark_temporary_error(key.index);
                }
            }
        }

        let mut result = SynthesisResult::failure(PROVIDER_NAME, Error::KeysExhausted.to_string());
        result.generation_time = self.clock.now().saturating_duration_since(started);
        Ok(result)
    }

    async fn info(&self) -> ProviderInfo {
        let status = if self.keys.is_empty() {
            ProviderAvailability::Unavailable
        } else if self.keys.any_usable() {
            ProviderAvailability::Available
        } else {
            ProviderAvailability::Degraded
        };

        ProviderInfo {
            name: PROVIDER_NAME.to_string(),
            status,
            last_success_time: *self.last_success.lock().expect("last success mutex poisoned"),
            supported_voices: vec![self.config.voice.clone()],
        }
    }
}
