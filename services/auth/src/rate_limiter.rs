//! Login throttle for slowing brute-force and enumeration attempts

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Login throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Maximum number of failed attempts before lockout
    pub max_failures: u32,
    /// Sliding window in seconds over which failures are counted
    pub window_seconds: u64,
    /// Lockout duration in seconds
    pub lockout_seconds: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,  // 5 minutes
            lockout_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct ThrottleEntry {
    failures: u32,
    last_failure: Instant,
    locked_until: Option<Instant>,
}

/// In-memory login throttle keyed by normalized username
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    config: ThrottleConfig,
    entries: Arc<Mutex<HashMap<String, ThrottleEntry>>>,
}

impl LoginThrottle {
    /// Create a new login throttle
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether a login attempt for this key is currently allowed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let expired = match entries.get(key) {
            None => return true,
            Some(entry) => {
                if let Some(locked_until) = entry.locked_until {
                    if now < locked_until {
                        return false;
                    }
                    true
                } else {
                    now.duration_since(entry.last_failure)
                        >= Duration::from_secs(self.config.window_seconds)
                }
            }
        };

        if expired {
            entries.remove(key);
        }
        true
    }

    /// Record a failed login attempt, locking the key out once the limit
    /// is reached
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(ThrottleEntry {
            failures: 0,
            last_failure: now,
            locked_until: None,
        });

        if now.duration_since(entry.last_failure) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
        }

        entry.failures += 1;
        entry.last_failure = now;

        if entry.failures >= self.config.max_failures {
            entry.locked_until = Some(now + Duration::from_secs(self.config.lockout_seconds));
            info!(
                "Locked out key {} for {} seconds",
                key, self.config.lockout_seconds
            );
        }
    }

    /// Clear the failure history for a key after a successful login
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> LoginThrottle {
        LoginThrottle::new(ThrottleConfig {
            max_failures: 3,
            window_seconds: 300,
            lockout_seconds: 900,
        })
    }

    #[tokio::test]
    async fn allows_until_limit() {
        let t = throttle();
        for _ in 0..2 {
            t.record_failure("lisa").await;
            assert!(t.is_allowed("lisa").await);
        }
        t.record_failure("lisa").await;
        assert!(!t.is_allowed("lisa").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let t = throttle();
        for _ in 0..3 {
            t.record_failure("lisa").await;
        }
        assert!(!t.is_allowed("lisa").await);
        assert!(t.is_allowed("todd").await);
    }

    #[tokio::test]
    async fn reset_clears_failures() {
        let t = throttle();
        t.record_failure("lisa").await;
        t.record_failure("lisa").await;
        t.reset("lisa").await;
        t.record_failure("lisa").await;
        assert!(t.is_allowed("lisa").await);
    }
}
