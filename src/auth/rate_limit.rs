use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding-window attempt counter per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Check if the given IP is rate-limited. Returns true if blocked.
    /// Also lazily cleans up stale entries for the checked IP.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let Some(cutoff) = Instant::now().checked_sub(self.window) else {
            return map.get(&ip).is_some_and(|t| t.len() >= self.max_attempts);
        };

        if let Some(timestamps) = map.get_mut(&ip) {
            timestamps.retain(|t| *t > cutoff);
            if timestamps.is_empty() {
                map.remove(&ip);
                return false;
            }
            timestamps.len() >= self.max_attempts
        } else {
            false
        }
    }

    /// Record an attempt that counts against the limit.
    pub fn record_failure(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(ip).or_default().push(Instant::now());
    }

    /// Clear all recorded attempts for the given IP (call on successful login).
    pub fn clear(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&ip);
    }
}
