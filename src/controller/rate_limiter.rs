// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-item exponential failure backoff.

use crate::constants::backoff::{BASE_DELAY_MS, MAX_DELAY_SECS};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Tracks consecutive failures per item; delay doubles with every failure up to `max_delay`.
#[derive(Debug)]
pub struct ItemExponentialRateLimiter<T> {
    failures: HashMap<T, u32>,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T: Eq + Hash + Clone> ItemExponentialRateLimiter<T> {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            failures: HashMap::new(),
            base_delay,
            max_delay,
        }
    }

    /// Record a failure for `item` and return how long it should wait before the next attempt
    pub fn when(&mut self, item: &T) -> Duration {
        let attempts = self.failures.entry(item.clone()).or_insert(0);
        let exponent = *attempts;
        *attempts = attempts.saturating_add(1);

        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    pub fn num_requeues(&self, item: &T) -> u32 {
        self.failures.get(item).copied().unwrap_or(0)
    }

    pub fn forget(&mut self, item: &T) {
        self.failures.remove(item);
    }
}

impl<T: Eq + Hash + Clone> Default for ItemExponentialRateLimiter<T> {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(BASE_DELAY_MS),
            Duration::from_secs(MAX_DELAY_SECS),
        )
    }
}
