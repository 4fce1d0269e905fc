// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deduplicating, rate-limited work queue of object identities.
//!
//! An identity is in at most one of two places at a time: waiting in the queue or
//! being processed by a worker. Adding an identity that is already waiting is a
//! no-op. Adding one that is being processed marks it dirty, and it is queued
//! again once the worker calls [`WorkQueue::done`]. This keeps a single Sync in
//! flight per identity while never losing an event that arrived mid-sync.

use crate::controller::rate_limiter::ItemExponentialRateLimiter;
use crate::controller::ObjectKey;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Default)]
struct QueueState {
    queue: VecDeque<ObjectKey>,
    /// Identities that need processing, queued or not
    dirty: HashSet<ObjectKey>,
    /// Identities currently handed out to a worker
    processing: HashSet<ObjectKey>,
    shutting_down: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    limiter: Mutex<ItemExponentialRateLimiter<ObjectKey>>,
    notify: Notify,
    shutdown: CancellationToken,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn limiter(&self) -> MutexGuard<'_, ItemExponentialRateLimiter<ObjectKey>> {
        self.limiter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheaply cloneable handle; all clones share the same queue.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::with_rate_limiter(ItemExponentialRateLimiter::default())
    }

    pub fn with_rate_limiter(limiter: ItemExponentialRateLimiter<ObjectKey>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                limiter: Mutex::new(limiter),
                notify: Notify::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn add(&self, key: ObjectKey) {
        let mut state = self.inner.state();
        if state.shutting_down || !state.dirty.insert(key.clone()) {
            return;
        }
        if state.processing.contains(&key) {
            trace!("{} is being processed, deferring", key);
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Add `key` once `delay` has elapsed. Pending delayed adds are dropped on shutdown.
    pub fn add_after(&self, key: ObjectKey, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        if self.is_shutting_down() {
            return;
        }

        let queue = self.clone();
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => queue.add(key),
            }
        });
    }

    /// Add `key` after the backoff its failure history calls for
    pub fn add_rate_limited(&self, key: ObjectKey) {
        let delay = self.inner.limiter().when(&key);
        trace!("Requeueing {} in {:?}", key, delay);
        self.add_after(key, delay);
    }

    /// Reset the failure history of `key`
    pub fn forget(&self, key: &ObjectKey) {
        self.inner.limiter().forget(key);
    }

    pub fn num_requeues(&self, key: &ObjectKey) -> u32 {
        self.inner.limiter().num_requeues(key)
    }

    /// Wait for the next identity. Returns `None` once the queue is shut down.
    pub async fn get(&self) -> Option<ObjectKey> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.inner.state();
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
            }

            notified.await;
        }
    }

    /// Mark processing of `key` finished, requeueing it if it was added meanwhile
    pub fn done(&self, key: &ObjectKey) {
        let mut state = self.inner.state();
        state.processing.remove(key);
        if state.dirty.contains(key) && !state.shutting_down {
            state.queue.push_back(key.clone());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Number of identities waiting to be handed out
    pub fn len(&self) -> usize {
        self.inner.state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shut_down(&self) {
        self.inner.state().shutting_down = true;
        self.inner.shutdown.cancel();
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.state().shutting_down
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
