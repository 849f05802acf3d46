// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection backoff policies shared by every [`super::connection::WsConnection`].

use std::time::Duration;

use tokio::time::sleep;

/// A pluggable policy for how long to wait before the next reconnect
/// attempt, and when to give up entirely.
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Never retry; the first failure closes the connection for good.
    None,
    /// Fixed delay between attempts, optionally capped at `limit` retries.
    Interval { delay: Duration, limit: Option<u32> },
    /// `min(2^attempt, max_interval)` backoff, optionally capped at `limit`
    /// retries.
    Exponential { max_interval: Duration, limit: Option<u32> },
}

impl RetryStrategy {
    pub fn exponential(max_interval: Duration) -> Self {
        RetryStrategy::Exponential { max_interval, limit: None }
    }

    pub fn interval(delay: Duration) -> Self {
        RetryStrategy::Interval { delay, limit: None }
    }

    pub fn state(&self) -> RetryState {
        RetryState { strategy: self.clone(), attempt: 0 }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::Exponential { max_interval: Duration::from_secs(16), limit: None }
    }
}

/// Per-connection retry counter paired with a [`RetryStrategy`]. Reset on
/// every successful connect so a long-lived connection that drops once a
/// day doesn't inherit backoff from a burst of failures a week ago.
#[derive(Debug, Clone)]
pub struct RetryState {
    strategy: RetryStrategy,
    attempt: u32,
}

impl RetryState {
    /// Sleeps for this attempt's backoff and returns `true` if another
    /// attempt should be made, `false` if the retry budget is exhausted.
    pub async fn retry(&mut self) -> bool {
        match &self.strategy {
            RetryStrategy::None => false,
            RetryStrategy::Interval { delay, limit } => {
                if limit.is_some_and(|l| self.attempt >= l) {
                    return false;
                }
                sleep(*delay).await;
                self.attempt += 1;
                true
            }
            RetryStrategy::Exponential { max_interval, limit } => {
                if limit.is_some_and(|l| self.attempt >= l) {
                    return false;
                }
                let backoff = Duration::from_secs_f64(2f64.powi(self.attempt as i32)).min(*max_interval);
                sleep(backoff).await;
                self.attempt += 1;
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
