use dashmap::DashMap;
use std::sync::Arc;
use teloxide::types::UserId;
use tokio::time::{Duration, Instant};

use crate::core::config;

/// Request counter of one user inside the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// When the current window opened
    pub started_at: Instant,
    /// Requests seen in the current window, denied ones included
    pub count: u32,
}

/// Fixed-window rate limiter keyed by Telegram user.
///
/// Each user gets `limit` requests per window. The first request after the
/// window has elapsed opens a new window. State lives in process memory only;
/// a restart forgets every counter.
///
/// The limiter is owned by whoever builds the pipeline and shared through
/// `Arc`, so tests get isolated state per case. Time comes from
/// `tokio::time::Instant`, which `tokio::time::pause` can freeze.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<UserId, RateWindow>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a limiter allowing `limit_per_min` requests per minute.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ttdl::core::rate_limiter::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(5);
    /// ```
    pub fn new(limit_per_min: u32) -> Self {
        Self::with_window(limit_per_min, config::rate_limit::window())
    }

    /// Creates a limiter with a custom window length.
    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records a request from `user_id` at `now` and says whether it may proceed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use teloxide::types::UserId;
    /// use tokio::time::Instant;
    /// use ttdl::core::rate_limiter::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(5);
    /// if !limiter.allow(UserId(123456789), Instant::now()) {
    ///     println!("slow down");
    /// }
    /// ```
    pub fn allow(&self, user_id: UserId, now: Instant) -> bool {
        let mut entry = self.windows.entry(user_id).or_insert(RateWindow {
            started_at: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started_at) > self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.limit
    }

    /// Same as [`allow`](Self::allow) with the current instant.
    pub fn allow_now(&self, user_id: UserId) -> bool {
        self.allow(user_id, Instant::now())
    }

    /// Time until the user's window resets, if the user is currently blocked.
    pub fn remaining(&self, user_id: UserId, now: Instant) -> Option<Duration> {
        let entry = self.windows.get(&user_id)?;
        if entry.count < self.limit {
            return None;
        }
        let elapsed = now.saturating_duration_since(entry.started_at);
        if elapsed > self.window {
            return None;
        }
        Some(self.window - elapsed)
    }

    /// Drops windows that have already expired. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) <= self.window);
        before - self.windows.len()
    }

    /// Number of users currently tracked
    pub fn tracked_users(&self) -> usize {
        self.windows.len()
    }

    /// Starts a background task that periodically purges expired windows.
    pub fn spawn_cleanup_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = self.purge_expired(Instant::now());
                if removed > 0 {
                    log::debug!("Rate limiter purged {} expired window(s)", removed);
                }
            }
        })
    }
}
