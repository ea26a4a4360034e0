use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Sliding log of admitted requests for one rate-limit key.
///
/// Holds at most `limit` timestamps (milliseconds since the Unix epoch), so the
/// memory for a key is bounded by its quota. Denied requests are not logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateWindow {
    pub key: String,
    pub limit: u32,
    pub window_ms: i64,
    pub hits: VecDeque<i64>,
}

impl RateWindow {
    pub fn new(key: impl Into<String>, limit: u32, window_ms: i64) -> Self {
        Self {
            key: key.into(),
            limit,
            window_ms,
            hits: VecDeque::new(),
        }
    }

    /// Drop hits that fell out of `[now - window, now]`.
    pub fn prune(&mut self, now_ms: i64) {
        let cutoff = now_ms - self.window_ms;
        while self.hits.front().is_some_and(|&hit| hit < cutoff) {
            self.hits.pop_front();
        }
    }

    /// Record a hit at `now_ms` if the window has room. Returns whether it was admitted.
    pub fn try_admit(&mut self, now_ms: i64) -> bool {
        self.prune(now_ms);
        if self.count() < self.limit {
            self.hits.push_back(now_ms);
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u32 {
        self.hits.len() as u32
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count())
    }

    /// Timestamp of the oldest hit still inside the window.
    pub fn window_start(&self) -> Option<i64> {
        self.hits.front().copied()
    }

    /// When the oldest hit leaves the window and frees a slot.
    pub fn reset_at_ms(&self, now_ms: i64) -> i64 {
        match self.window_start() {
            Some(oldest) => oldest + self.window_ms + 1,
            None => now_ms,
        }
    }

    /// After this instant the window holds no hits and the entry can be reclaimed.
    pub fn idle_after_ms(&self) -> Option<i64> {
        self.hits.back().map(|&last| last + self.window_ms + 1)
    }
}
