//! Speech Synthesis Domain Model
//!
//! Defines the value objects that flow through the provider chain: the
//! synthesis request with its routing hints, the synthesized audio, and the
//! per-attempt diagnostics accumulated while falling through providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// A single text-to-speech request
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct SynthesisRequest {
    /// Text to synthesize
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Text must be between 1 and 10000 characters"
    ))]
    pub text: String,
    /// Backend-specific voice identifier
    #[serde(default)]
    pub voice: Option<String>,
    /// Speaking rate adjustment in [-100, +100]; 0 keeps the backend default
    #[serde(default)]
    #[validate(range(min = -100, max = 100, message = "Rate must be in [-100, 100]"))]
    pub rate: i32,
    /// Pitch adjustment in [-100, +100]; 0 keeps the backend default
    #[serde(default)]
    #[validate(range(min = -100, max = 100, message = "Pitch must be in [-100, 100]"))]
    pub pitch: i32,
    /// Provider hoisted to the front of the default order when it matches
    #[serde(default)]
    pub preferred_provider: Option<String>,
    /// Explicit provider ordering overriding the default order when non-empty
    #[serde(default)]
    pub fallback_chain: Vec<String>,
    /// Diagnostic tag: logical agent issuing the request
    #[serde(default)]
    pub agent_name: Option<String>,
    /// Diagnostic tag: concrete agent instance issuing the request
    #[serde(default)]
    pub agent_instance_id: Option<String>,
}

impl SynthesisRequest {
    /// Create a request for the given text with all routing hints unset
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Synthesized audio, either in memory or spilled to a file by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AudioData {
    Memory {
        bytes: Vec<u8>,
        content_type: String,
    },
    File {
        path: PathBuf,
        content_type: String,
    },
}

impl AudioData {
    /// MIME content type of the audio payload
    pub fn content_type(&self) -> &str {
        match self {
            Self::Memory { content_type, .. } => content_type,
            Self::File { content_type, .. } => content_type,
        }
    }
}

/// Diagnostic record for one provider tried during a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider_name: String,
    pub error_message: String,
    pub duration: Duration,
}

/// Outcome of a synthesis request
///
/// Exactly one provider's audio is ever returned; `attempts` lists the
/// providers tried before the winner (all of them on failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub success: bool,
    pub audio: Option<AudioData>,
    pub provider_used: Option<String>,
    /// Time from chain entry to result; on failure the sum of attempt durations
    pub generation_time: Duration,
    /// Best-effort estimate of the audio length, when the winner can tell
    pub audio_duration: Option<Duration>,
    pub error_message: Option<String>,
    pub attempts: Vec<AttemptRecord>,
}

impl SynthesisResult {
    /// Successful result carrying audio from the named provider
    pub fn success(
        provider: impl Into<String>,
        audio: AudioData,
        generation_time: Duration,
    ) -> Self {
        Self {
            success: true,
            audio: Some(audio),
            provider_used: Some(provider.into()),
            generation_time,
            audio_duration: None,
            error_message: None,
            attempts: Vec::new(),
        }
    }

    /// Failed result from the named provider
    pub fn failure(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            audio: None,
            provider_used: Some(provider.into()),
            generation_time: Duration::ZERO,
            audio_duration: None,
            error_message: Some(message.into()),
            attempts: Vec::new(),
        }
    }

    /// Set the best-effort audio duration estimate
    pub fn with_audio_duration(mut self, duration: Option<Duration>) -> Self {
        self.audio_duration = duration;
        self
    }
}

/// Availability reported by a provider's own `info()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderAvailability {
    Available,
    Unavailable,
    Degraded,
    Disabled,
}

impl std::fmt::Display for ProviderAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Degraded => write!(f, "degraded"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Self-reported provider diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub status: ProviderAvailability,
    pub last_success_time: Option<DateTime<Utc>>,
    pub supported_voices: Vec<String>,
}

/// Audio container produced by cloud backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioEncoding {
    #[default]
    #[serde(rename = "MP3")]
    Mp3,
    #[serde(rename = "LINEAR16")]
    Linear16,
    #[serde(rename = "OGG_OPUS")]
    OggOpus,
}

impl AudioEncoding {
    /// Wire name used in cloud request bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::Linear16 => "LINEAR16",
            Self::OggOpus => "OGG_OPUS",
        }
    }

    /// MIME content type of audio produced with this encoding
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            _ => "audio/wav",
        }
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
