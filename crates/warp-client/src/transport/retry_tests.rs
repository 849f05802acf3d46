// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::retry::RetryStrategy;

#[tokio::test]
async fn none_strategy_never_retries() {
    let mut state = RetryStrategy::None.state();
    assert!(!state.retry().await);
}

#[tokio::test]
async fn interval_strategy_retries_until_limit() {
    let mut state = RetryStrategy::Interval { delay: Duration::from_millis(1), limit: Some(2) }.state();
    assert!(state.retry().await);
    assert!(state.retry().await);
    assert!(!state.retry().await);
}

#[tokio::test]
async fn exponential_strategy_resets_after_success() {
    let mut state =
        RetryStrategy::Exponential { max_interval: Duration::from_millis(4), limit: Some(1) }.state();
    assert!(state.retry().await);
    assert!(!state.retry().await);
    state.reset();
    assert!(state.retry().await);
}
