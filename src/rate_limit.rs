use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

// Sliding window limiter - keeps the request instants per client
// The DashMap entry guard locks the client's shard while we prune + push
#[derive(Default)]
pub struct RateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    pub fn admit(&self, client_id: &str, max_requests: u32, window: Duration) -> bool {
        self.admit_at(client_id, max_requests, window, Instant::now())
    }

    pub fn admit_at(
        &self,
        client_id: &str,
        max_requests: u32,
        window: Duration,
        now: Instant,
    ) -> bool {
        let mut timestamps = self
            .windows
            .entry(client_id.to_string())
            .or_default();

        // drop everything that fell out of the window
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        // over limit
        if timestamps.len() >= max_requests as usize {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    // Remove clients with nothing left inside the window (sweeper)
    pub fn purge_idle(&self, window: Duration) -> usize {
        self.purge_idle_at(window, Instant::now())
    }

    pub fn purge_idle_at(&self, window: Duration, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < window)
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}
