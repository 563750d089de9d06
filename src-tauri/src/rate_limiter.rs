use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Entry untuk rate limiting
#[derive(Clone, Debug)]
struct RateLimitEntry {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Fixed-window limiter keyed by an arbitrary string
/// (username for login attempts, `low_stock:<id>` for stock alerts).
pub struct RateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    /// Max hits per window
    max_requests: u32,
    /// Window duration in seconds
    window_seconds: i64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests,
            window_seconds,
        }
    }

    /// Count one hit for `key`.
    /// Returns Ok(()) if allowed, Err(message) if the limit is exceeded.
    pub fn check(&self, key: &str) -> Result<(), String> {
        self.check_at(key, Utc::now())
    }

    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<(), String> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| "Failed to acquire rate limiter lock")?;

        let window_duration = Duration::seconds(self.window_seconds);

        let entry = entries.entry(key.to_string()).or_insert_with(|| RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now >= entry.window_start + window_duration {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;

        if entry.count > self.max_requests {
            let retry_after = (entry.window_start + window_duration - now).num_seconds();
            return Err(format!(
                "Terlalu banyak percobaan. Coba lagi dalam {} detik.",
                retry_after.max(0)
            ));
        }

        Ok(())
    }

    /// True when `key` already used up its window (does not count a hit)
    pub fn is_limited(&self, key: &str) -> bool {
        let Ok(entries) = self.entries.lock() else {
            return false;
        };
        entries.get(key).is_some_and(|e| {
            e.count >= self.max_requests
                && Utc::now() < e.window_start + Duration::seconds(self.window_seconds)
        })
    }

    /// Forget all hits for `key`
    pub fn reset(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
