//! Sliding-window rate-limit budget.
//!
//! The Riot API enforces two independent limits (a short burst limit and a
//! sustained limit), so the budget tracks one timestamp queue per window.
//! A request is permitted only when every window has capacity. The budget is
//! the one piece of state shared by concurrent requesters; eviction, the
//! capacity check, and timestamp recording happen atomically under a single
//! async mutex so two callers cannot both observe spare capacity and jointly
//! exceed a limit. Waiting happens outside the lock.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::debug;

/// One sliding window: at most `max_requests` within any `window` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl WindowLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

#[derive(Debug)]
struct Window {
    limit: WindowLimit,
    stamps: VecDeque<Instant>,
}

impl Window {
    /// Drop timestamps that have left the window.
    fn evict(&mut self, now: Instant) {
        while let Some(&front) = self.stamps.front() {
            if now.duration_since(front) >= self.limit.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until the oldest retained timestamp exits the window, or `None`
    /// if there is spare capacity right now. Call after `evict`.
    fn wait_for_capacity(&self, now: Instant) -> Option<Duration> {
        if (self.stamps.len() as u32) < self.limit.max_requests {
            return None;
        }
        self.stamps
            .front()
            .map(|&front| self.limit.window.saturating_sub(now.duration_since(front)))
    }
}

/// Tracks remaining request permissions across one or more sliding windows.
pub struct RateLimitBudget {
    windows: Mutex<Vec<Window>>,
}

impl RateLimitBudget {
    pub fn new(limits: Vec<WindowLimit>) -> Self {
        let windows = limits
            .into_iter()
            .map(|limit| Window {
                limit,
                stamps: VecDeque::new(),
            })
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }

    /// Wait until every window has capacity, then record the request
    /// timestamp in all of them. Recording happens under the same lock as
    /// the capacity check.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                let mut longest: Option<Duration> = None;
                for window in windows.iter_mut() {
                    window.evict(now);
                    if let Some(wait) = window.wait_for_capacity(now) {
                        longest = Some(longest.map_or(wait, |cur| cur.max(wait)));
                    }
                }
                match longest {
                    None => {
                        for window in windows.iter_mut() {
                            window.stamps.push_back(now);
                        }
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "rate limit budget exhausted, waiting");
            time::sleep(wait).await;
        }
    }

    /// Like [`acquire`](Self::acquire), but gives up after `timeout`.
    /// Returns whether a slot was granted; a timed-out waiter records
    /// nothing.
    pub async fn acquire_timeout(&self, timeout: Duration) -> bool {
        time::timeout(timeout, self.acquire()).await.is_ok()
    }

    /// Requests currently retained per window, oldest windows first.
    /// Evicts expired entries before counting.
    pub async fn occupancy(&self) -> Vec<usize> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        windows
            .iter_mut()
            .map(|window| {
                window.evict(now);
                window.stamps.len()
            })
            .collect()
    }
}
