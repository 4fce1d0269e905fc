// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controller assembly and the per-worker reconciliation loop.

use crate::controller::informer::KeyFn;
use crate::controller::{FilterFuncs, Informer, KeySyncer, ObjectKey, WorkQueue};
use crate::error::Result;
use futures::future::BoxFuture;
use futures::Stream;
use kube::runtime::watcher;
use kube::Resource;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type InformerTask = Box<dyn FnOnce(WorkQueue, CancellationToken) -> BoxFuture<'static, ()> + Send>;

/// A [`KeySyncer`] bound to the informers that feed its work queue.
pub struct Controller<S: KeySyncer> {
    name: String,
    syncer: Arc<S>,
    queue: WorkQueue,
    informers: Vec<InformerTask>,
    synced: Vec<watch::Receiver<bool>>,
}

impl<S: KeySyncer> Controller<S> {
    pub fn new(name: impl Into<String>, syncer: S) -> Self {
        Self {
            name: name.into(),
            syncer: Arc::new(syncer),
            queue: WorkQueue::new(),
            informers: Vec::new(),
            synced: Vec::new(),
        }
    }

    /// Enqueue the object's own identity for every event `filters` accept
    pub fn with_informer<K, St>(self, informer: Informer<K>, events: St, filters: FilterFuncs<K>) -> Self
    where
        K: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static,
        St: Stream<Item = std::result::Result<watcher::Event<K>, watcher::Error>> + Send + 'static,
    {
        self.with_mapped_informer(informer, events, filters, |obj: &K| {
            Some(ObjectKey::from_object(obj))
        })
    }

    /// Like [`Controller::with_informer`], but enqueue whatever identity `key_fn` maps the event to
    pub fn with_mapped_informer<K, St, F>(
        mut self,
        informer: Informer<K>,
        events: St,
        filters: FilterFuncs<K>,
        key_fn: F,
    ) -> Self
    where
        K: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static,
        St: Stream<Item = std::result::Result<watcher::Event<K>, watcher::Error>> + Send + 'static,
        F: Fn(&K) -> Option<ObjectKey> + Send + Sync + 'static,
    {
        let key_fn: KeyFn<K> = Arc::new(key_fn);
        self.synced.push(informer.synced());
        self.informers.push(Box::new(move |queue, shutdown| {
            Box::pin(informer.run(events, filters, key_fn, queue, shutdown))
        }));
        self
    }

    pub fn queue(&self) -> WorkQueue {
        self.queue.clone()
    }

    /// Run informers and `workers` reconciliation loops until `shutdown` fires.
    ///
    /// Workers only start once every informer cache has synced. On shutdown the
    /// queue is closed, idle workers return immediately and busy ones finish the
    /// sync they are running.
    pub async fn run(self, workers: usize, shutdown: CancellationToken) -> anyhow::Result<()> {
        info!("Starting {}", self.name);

        let mut informers = JoinSet::new();
        for task in self.informers {
            informers.spawn(task(self.queue.clone(), shutdown.clone()));
        }

        if wait_for_cache_sync(self.synced, &shutdown).await {
            info!("{} caches synced, starting {} workers", self.name, workers);

            let mut pool = JoinSet::new();
            for _ in 0..workers {
                let name = self.name.clone();
                let syncer = self.syncer.clone();
                let queue = self.queue.clone();
                pool.spawn(async move {
                    while process_next_item(&name, syncer.as_ref(), &queue).await {}
                });
            }

            shutdown.cancelled().await;
            info!("Shutting down {}", self.name);
            self.queue.shut_down();

            while let Some(res) = pool.join_next().await {
                if let Err(e) = res {
                    error!("{} worker failed: {}", self.name, e);
                }
            }
        } else {
            self.queue.shut_down();
        }

        while let Some(res) = informers.join_next().await {
            if let Err(e) = res {
                error!("{} informer failed: {}", self.name, e);
            }
        }

        info!("{} stopped", self.name);
        Ok(())
    }
}

/// Returns `false` if shutdown fired before every cache synced
async fn wait_for_cache_sync(synced: Vec<watch::Receiver<bool>>, shutdown: &CancellationToken) -> bool {
    for mut rx in synced {
        tokio::select! {
            _ = shutdown.cancelled() => return false,
            synced = async { rx.wait_for(|synced| *synced).await.is_ok() } => {
                if !synced {
                    warn!("Informer stopped before its cache synced");
                }
            }
        }
    }
    !shutdown.is_cancelled()
}

/// One pass of the reconciliation loop. Returns `false` once the queue is shut down.
pub(crate) async fn process_next_item<S: KeySyncer>(name: &str, syncer: &S, queue: &WorkQueue) -> bool {
    let Some(key) = queue.get().await else {
        return false;
    };

    match reconcile_key(syncer, &key).await {
        Ok(()) => {
            debug!("{} synced {}", name, key);
            queue.forget(&key);
        }
        Err(e) => {
            warn!(
                "{} failed to sync {} (attempt {}): {}",
                name,
                key,
                queue.num_requeues(&key) + 1,
                e
            );
            queue.add_rate_limited(key.clone());
        }
    }

    queue.done(&key);
    true
}

async fn reconcile_key<S: KeySyncer>(syncer: &S, key: &ObjectKey) -> Result<()> {
    let obj = match syncer.key(&key.namespace, &key.name) {
        Ok(obj) => obj,
        Err(e) if e.is_not_found() => {
            debug!("{} no longer exists, nothing to do", key);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    syncer.sync(obj).await
}
