// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch event delivery backed by a local read cache.
//!
//! The informer keeps a reflector store up to date from a watch stream and hands
//! each event to the controller's filters. Updates are recognised by looking the
//! object up in the cache before the event is applied, so update filters see the
//! previous state as well as the new one.
//!
//! The reflector only swaps a (re)list into the cache at `InitDone`, so accepted
//! objects from `InitApply` are held back until then. A worker never dequeues a
//! key the cache cannot resolve yet.

use crate::controller::{FilterFuncs, ObjectKey, WorkQueue};
use futures::{Stream, StreamExt};
use kube::runtime::reflector::{store::Writer, ObjectRef, Store};
use kube::runtime::watcher;
use kube::Resource;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub type KeyFn<K> = Arc<dyn Fn(&K) -> Option<ObjectKey> + Send + Sync>;

pub struct Informer<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static,
{
    writer: Writer<K>,
    reader: Store<K>,
    synced: watch::Sender<bool>,
    /// accepted objects of the list in progress
    pending: Vec<K>,
}

impl<K> Informer<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let writer = Writer::default();
        let reader = writer.as_reader();
        let (synced, _) = watch::channel(false);
        Self {
            writer,
            reader,
            synced,
            pending: Vec::new(),
        }
    }

    /// Read-through cache populated by this informer
    pub fn lister(&self) -> Store<K> {
        self.reader.clone()
    }

    /// Flips to `true` once the initial list has been applied to the cache
    pub fn synced(&self) -> watch::Receiver<bool> {
        self.synced.subscribe()
    }

    /// Consume `events` until the stream ends or `shutdown` fires, enqueueing
    /// the identity `key_fn` derives for every event the filters accept.
    pub async fn run<S>(
        mut self,
        events: S,
        filters: FilterFuncs<K>,
        key_fn: KeyFn<K>,
        queue: WorkQueue,
        shutdown: CancellationToken,
    ) where
        S: Stream<Item = Result<watcher::Event<K>, watcher::Error>> + Send,
    {
        let kind = K::kind(&()).to_string();
        let mut events = std::pin::pin!(events);
        info!("Starting {} informer", kind);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = events.next() => match next {
                    Some(Ok(event)) => {
                        for obj in self.handle_event(event, &filters) {
                            if let Some(key) = key_fn(&obj) {
                                trace!("Enqueueing {} for {} event", key, kind);
                                queue.add(key);
                            }
                        }
                    }
                    Some(Err(e)) => warn!("{} watch error: {}", kind, e),
                    None => {
                        debug!("{} watch stream ended", kind);
                        break;
                    }
                }
            }
        }

        info!("Stopped {} informer", kind);
    }

    /// Apply `event` to the cache and return the objects whose keys may now be enqueued
    fn handle_event(&mut self, event: watcher::Event<K>, filters: &FilterFuncs<K>) -> Vec<K> {
        let relevant = match &event {
            watcher::Event::Apply(obj) | watcher::Event::InitApply(obj) => {
                match self.reader.get(&ObjectRef::from_obj(obj)) {
                    Some(old) => filters.accept_update(&old, obj),
                    None => filters.accept_add(obj),
                }
            }
            watcher::Event::Delete(obj) => filters.accept_delete(obj),
            watcher::Event::Init => {
                self.pending.clear();
                false
            }
            watcher::Event::InitDone => {
                self.writer.apply_watcher_event(&event);
                self.synced.send_replace(true);
                return std::mem::take(&mut self.pending);
            }
        };

        self.writer.apply_watcher_event(&event);

        match event {
            watcher::Event::InitApply(obj) if relevant => {
                self.pending.push(obj);
                Vec::new()
            }
            watcher::Event::Apply(obj) | watcher::Event::Delete(obj) if relevant => vec![obj],
            _ => Vec::new(),
        }
    }
}

impl<K> Default for Informer<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
