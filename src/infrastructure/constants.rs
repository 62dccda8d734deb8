//! Application-wide constants
//!
//! Centralizes timeout values, cooldowns, and other magic numbers so the
//! defaults live in one place.

use std::time::Duration;

// =============================================================================
// Request limits
// =============================================================================

/// Maximum synthesis text length in characters, after trimming
pub const MAX_TEXT_CHARS: usize = 10_000;

// =============================================================================
// Circuit breaker defaults
// =============================================================================

/// Consecutive failures before a provider's circuit opens
pub const BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// How long an open circuit waits before allowing a trial call
pub const BREAKER_RESET_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound on the reset timeout under exponential backoff
pub const BREAKER_MAX_RESET_TIMEOUT: Duration = Duration::from_secs(3600);

/// Sentinel threshold that keeps a breaker effectively disabled
///
/// Used for the terminal offline fallback, which must always be attempted.
pub const BREAKER_THRESHOLD_DISABLED: u32 = u32::MAX;

// =============================================================================
// Google Cloud TTS
// =============================================================================

/// Synthesis endpoint; the API key is appended as a query parameter
pub const GOOGLE_TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Fallback language code when one cannot be derived from the voice name
pub const DEFAULT_LANGUAGE_CODE: &str = "cs-CZ";

/// Default output sample rate
pub const DEFAULT_SAMPLE_RATE_HERTZ: u32 = 24_000;

/// Default HTTP timeout for synthesis calls
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// API key cooldowns
// =============================================================================

/// Cooldown after a 429 before a key is eligible again (1 hour)
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Cooldown after a 403 quota rejection (24 hours)
pub const QUOTA_EXCEEDED_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// Cooldown after a transient 5xx; short enough that the key is usable again
/// on the next request while the current request moves to another key
pub const TEMPORARY_ERROR_COOLDOWN: Duration = Duration::from_secs(5);
