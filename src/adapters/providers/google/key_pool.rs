//! API key pool
//!
//! Per-credential state machines for the multi-key cloud client. Keys are
//! held in a fixed-order list; selection walks that order so earlier keys
//! are always preferred once their cooldowns lapse. One mutex covers the
//! whole pool; HTTP I/O never happens under it.

use crate::domain::ports::Clock;
use crate::infrastructure::constants::{
    QUOTA_EXCEEDED_COOLDOWN, RATE_LIMIT_COOLDOWN, TEMPORARY_ERROR_COOLDOWN,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Lifecycle state of one API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Available,
    RateLimited,
    QuotaExceeded,
    /// Rejected by the backend as unauthorized; terminal
    Invalid,
    TemporaryError,
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::RateLimited => write!(f, "rate-limited"),
            Self::QuotaExceeded => write!(f, "quota-exceeded"),
            Self::Invalid => write!(f, "invalid"),
            Self::TemporaryError => write!(f, "temporary-error"),
        }
    }
}

/// Immutable identity of one API key
#[derive(Clone)]
pub struct ApiKey {
    pub index: usize,
    pub display_name: String,
    pub secret: String,
}

// The secret must never reach logs or error messages
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("index", &self.index)
            .field("display_name", &self.display_name)
            .field("secret", &"***")
            .finish()
    }
}

/// Cooldown durations applied by the state transitions
#[derive(Debug, Clone, Copy)]
pub struct KeyCooldowns {
    pub rate_limited: Duration,
    pub quota_exceeded: Duration,
    pub temporary_error: Duration,
}

impl Default for KeyCooldowns {
    fn default() -> Self {
        Self {
            rate_limited: RATE_LIMIT_COOLDOWN,
            quota_exceeded: QUOTA_EXCEEDED_COOLDOWN,
            temporary_error: TEMPORARY_ERROR_COOLDOWN,
        }
    }
}

/// Point-in-time view of one key for diagnostics
#[derive(Debug, Clone)]
pub struct KeySnapshot {
    pub index: usize,
    pub display_name: String,
    pub status: KeyStatus,
    pub cooldown_until: Option<Instant>,
}

struct KeySlot {
    key: ApiKey,
    status: KeyStatus,
    cooldown_until: Option<Instant>,
}

/// Fixed-order pool of API keys with per-key cooldown state
pub struct KeyPool {
    clock: Arc<dyn Clock>,
    cooldowns: KeyCooldowns,
    slots: Mutex<Vec<KeySlot>>,
}

impl KeyPool {
    pub fn new(keys: Vec<ApiKey>, cooldowns: KeyCooldowns, clock: Arc<dyn Clock>) -> Self {
        let slots = keys
            .into_iter()
            .map(|key| KeySlot {
                key,
                status: KeyStatus::Available,
                cooldown_until: None,
            })
            .collect();
        Self {
            clock,
            cooldowns,
            slots: Mutex::new(slots),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().expect("key pool mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select the next usable key, reviving expired cooldowns on the way
    ///
    /// Walks the list in index order: invalid keys are skipped, the first
    /// `Available` key wins, otherwise the first key whose cooldown has
    /// lapsed is flipped back to `Available` and returned.
    pub fn next_available(&self) -> Option<ApiKey> {
        let now = self.clock.now();
        let mut slots = self.slots.lock().expect("key pool mutex poisoned");

        if let Some(slot) = slots
            .iter()
            .find(|slot| slot.status == KeyStatus::Available)
        {
            return Some(slot.key.clone());
        }

        for slot in slots.iter_mut() {
            if slot.status == KeyStatus::Invalid {
                continue;
            }
            if let Some(until) = slot.cooldown_until {
                if now >= until {
                    debug!(key = %slot.key.display_name, "Key cooldown expired, reviving");
                    slot.status = KeyStatus::Available;
                    slot.cooldown_until = None;
                    return Some(slot.key.clone());
                }
            }
        }

        None
    }

    /// The key hit a rate limit; cool it down for `rate_limited`
    pub fn mark_rate_limited(&self, index: usize) {
        self.mark(index, KeyStatus::RateLimited, Some(self.cooldowns.rate_limited));
    }

    /// The key's quota is exhausted; cool it down for `quota_exceeded`
    pub fn mark_quota_exceeded(&self, index: usize) {
        self.mark(
            index,
            KeyStatus::QuotaExceeded,
            Some(self.cooldowns.quota_exceeded),
        );
    }

    /// The key was rejected as unauthorized; never use it again
    pub fn mark_invalid(&self, index: usize) {
        self.mark(index, KeyStatus::Invalid, None);
    }

    /// The backend had a transient problem; cool the key briefly so the
    /// current request moves on while near-future requests can reuse it
    pub fn mark_temporary_error(&self, index: usize) {
        self.mark(
            index,
            KeyStatus::TemporaryError,
            Some(self.cooldowns.temporary_error),
        );
    }

    fn mark(&self, index: usize, status: KeyStatus, cooldown: Option<Duration>) {
        let now = self.clock.now();
        let mut slots = self.slots.lock().expect("key pool mutex poisoned");
        if let Some(slot) = slots.get_mut(index) {
            warn!(key = %slot.key.display_name, status = %status, "API key state transition");
            slot.status = status;
            slot.cooldown_until = cooldown.map(|d| now + d);
        }
    }

    /// Whether any key is usable right now, without mutating pool state
    pub fn any_usable(&self) -> bool {
        let now = self.clock.now();
        let slots = self.slots.lock().expect("key pool mutex poisoned");
        slots.iter().any(|slot| match slot.status {
            KeyStatus::Available => true,
            KeyStatus::Invalid => false,
            _ => slot.cooldown_until.is_some_and(|until| now >= until),
        })
    }

    /// Diagnostics view of every key
    pub fn snapshot(&self) -> Vec<KeySnapshot> {
        let slots = self.slots.lock().expect("key pool mutex poisoned");
        slots
            .iter()
            .map(|slot| KeySnapshot {
                index: slot.key.index,
                display_name: slot.key.display_name.clone(),
                status: slot.status,
                cooldown_until: slot.cooldown_until,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::VirtualClock;

    fn pool(count: usize) -> (KeyPool, Arc<VirtualClock>) {
        let clock = Arc::new(VirtualClock::new());
        let keys = (0..count)
            .map(|index| ApiKey {
                index,
                display_name: format!("key-{}", index + 1),
                secret: format!("secret-{index}"),
            })
            .collect();
        let pool = KeyPool::new(keys, KeyCooldowns::default(), clock.clone());
        (pool, clock)
    }

    #[test]
    fn selects_keys_in_index_order() {
        let (pool, _clock) = pool(3);
        assert_eq!(pool.next_available().unwrap().index, 0);
        pool.mark_rate_limited(0);
        assert_eq!(pool.next_available().unwrap().index, 1);
        pool.mark_rate_limited(1);
        assert_eq!(pool.next_available().unwrap().index, 2);
    }

    #[test]
    fn invalid_keys_are_never_revived() {
        let (pool, clock) = pool(1);
        pool.mark_invalid(0);
        assert!(pool.next_available().is_none());
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert!(pool.next_available().is_none());
        assert!(!pool.any_usable());
    }

    #[test]
    fn cooldown_expiry_revives_key() {
        let (pool, clock) = pool(1);
        pool.mark_rate_limited(0);
        assert!(pool.next_available().is_none());

        clock.advance(RATE_LIMIT_COOLDOWN - Duration::from_secs(1));
        assert!(pool.next_available().is_none());

        clock.advance(Duration::from_secs(1));
        let key = pool.next_available().expect("key should be revived");
        assert_eq!(key.index, 0);
        assert_eq!(pool.snapshot()[0].status, KeyStatus::Available);
    }

    #[test]
    fn temporary_error_cooldown_is_short() {
        let (pool, clock) = pool(2);
        pool.mark_temporary_error(0);
        assert_eq!(pool.next_available().unwrap().index, 1);

        pool.mark_temporary_error(1);
        assert!(pool.next_available().is_none());

        clock.advance(TEMPORARY_ERROR_COOLDOWN);
        assert_eq!(pool.next_available().unwrap().index, 0);
    }

    #[test]
    fn available_key_wins_over_revivable_one() {
        let (pool, clock) = pool(2);
        pool.mark_temporary_error(0);
        assert_eq!(pool.next_available().unwrap().index, 1);

        // Key 1 is still Available, so it keeps winning even though key 0's
        // cooldown has lapsed
        clock.advance(TEMPORARY_ERROR_COOLDOWN);
        assert_eq!(pool.next_available().unwrap().index, 1);
    }

    #[test]
    fn debug_redacts_secret() {
        let key = ApiKey {
            index: 0,
            display_name: "primary".to_string(),
            secret: "sk-super-secret".to_string(),
        };
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("sk-super-secret"));
        assert!(rendered.contains("primary"));
    }
}
