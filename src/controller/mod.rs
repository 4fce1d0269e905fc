// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic reconciliation engine: event filters, work queue, informers and worker pool.

pub mod filter;
pub mod informer;
pub mod queue;
pub mod rate_limiter;
pub mod runner;

pub use filter::FilterFuncs;
pub use informer::Informer;
pub use queue::WorkQueue;
pub use rate_limiter::ItemExponentialRateLimiter;
pub use runner::Controller;

use crate::error::Result;
use kube::ResourceExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Identity of a watched object within its kind. Cluster-scoped objects have an empty namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn cluster_scoped(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    pub fn from_object<K: ResourceExt>(obj: &K) -> Self {
        Self::new(obj.namespace().unwrap_or_default(), obj.name_any())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// The pluggable part of a controller.
///
/// `key` resolves an identity to the cached object and must return a not-found
/// error when the object is gone. `sync` drives the object toward its desired
/// state. It receives a shared snapshot, so it must clone before mutating, and it
/// must be safe to call repeatedly with the same or stale input. An `Err` from
/// either requeues the identity with backoff.
pub trait KeySyncer: Send + Sync + 'static {
    type Object: Send + Sync + 'static;

    fn key(&self, namespace: &str, name: &str) -> Result<Arc<Self::Object>>;

    fn sync(&self, obj: Arc<Self::Object>) -> impl Future<Output = Result<()>> + Send;
}
