// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMap CA bundle injector - writes the service CA bundle into annotated ConfigMaps.

use crate::constants::{annotations, INJECTION_DATA_KEY};
use crate::controller::{Controller, FilterFuncs, Informer, KeySyncer};
use crate::error::Result;
use crate::kubernetes::{KubeStore, Lister, ObjectStore};
use k8s_openapi::api::core::v1::ConfigMap;
use kube_runtime::reflector::Store;
use kube_runtime::watcher::{watcher, Config as WatcherConfig};
use kube_runtime::WatchStreamExt;
use kube::{Api, Client, Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const CONTROLLER_NAME: &str = "ConfigMapCABundleInjectionController";

/// Check if an object has the inject-cabundle annotation set to "true"
pub fn has_inject_cabundle_annotation<K: Resource>(obj: &K) -> bool {
    obj.annotations()
        .get(annotations::INJECT_CABUNDLE)
        .is_some_and(|v| v == "true")
}

/// Updates are relevant whenever the new state carries the annotation
pub fn has_inject_cabundle_annotation_update<K: Resource>(_old: &K, new: &K) -> bool {
    has_inject_cabundle_annotation(new)
}

pub fn injection_filters() -> FilterFuncs<ConfigMap> {
    FilterFuncs::new()
        .with_add(has_inject_cabundle_annotation::<ConfigMap>)
        .with_update(has_inject_cabundle_annotation_update::<ConfigMap>)
}

/// True when the data is exactly `{INJECTION_DATA_KEY: ca_bundle}`
fn is_injected(configmap: &ConfigMap, ca_bundle: &str) -> bool {
    configmap.data.as_ref().is_some_and(|data| {
        data.len() == 1 && data.get(INJECTION_DATA_KEY).is_some_and(|v| v == ca_bundle)
    })
}

pub struct ConfigMapCABundleInjector<L, S> {
    lister: L,
    store: S,
    ca_bundle: String,
}

impl<L, S> ConfigMapCABundleInjector<L, S>
where
    L: Lister<ConfigMap>,
    S: ObjectStore<ConfigMap>,
{
    pub fn new(lister: L, store: S, ca_bundle: String) -> Self {
        Self {
            lister,
            store,
            ca_bundle,
        }
    }

    #[instrument(skip(self, current), fields(configmap = %format!("{}/{}", current.namespace().unwrap_or_default(), current.name_any())))]
    async fn ensure_injection(&self, current: &ConfigMap) -> Result<()> {
        if is_injected(current, &self.ca_bundle) {
            debug!("CA bundle already present, skipping update");
            return Ok(());
        }

        // the cached object is shared, write to a copy
        let mut configmap = current.clone();
        configmap.data = Some(BTreeMap::from([(
            INJECTION_DATA_KEY.to_string(),
            self.ca_bundle.clone(),
        )]));
        self.store.update(&configmap).await?;

        info!("Injected CA bundle");
        Ok(())
    }
}

impl<L, S> KeySyncer for ConfigMapCABundleInjector<L, S>
where
    L: Lister<ConfigMap>,
    S: ObjectStore<ConfigMap>,
{
    type Object = ConfigMap;

    fn key(&self, namespace: &str, name: &str) -> Result<Arc<ConfigMap>> {
        self.lister.get_cached(namespace, name)
    }

    async fn sync(&self, configmap: Arc<ConfigMap>) -> Result<()> {
        // the annotation may have been removed since the event was queued
        if !has_inject_cabundle_annotation(configmap.as_ref()) {
            debug!(
                "ConfigMap {}/{} no longer requests injection, skipping",
                configmap.namespace().unwrap_or_default(),
                configmap.name_any()
            );
            return Ok(());
        }
        self.ensure_injection(&configmap).await
    }
}

pub type KubeConfigMapInjector = ConfigMapCABundleInjector<Store<ConfigMap>, KubeStore<ConfigMap>>;

/// Build the injection controller watching ConfigMaps in all namespaces
pub fn new_configmap_cabundle_controller(
    client: Client,
    ca_bundle: String,
) -> Controller<KubeConfigMapInjector> {
    let informer = Informer::<ConfigMap>::new();
    let injector = ConfigMapCABundleInjector::new(
        informer.lister(),
        KubeStore::namespaced(client.clone()),
        ca_bundle,
    );
    let events = watcher(Api::<ConfigMap>::all(client), WatcherConfig::default()).default_backoff();

    Controller::new(CONTROLLER_NAME, injector).with_informer(informer, events, injection_filters())
}
