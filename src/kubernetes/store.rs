// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reads and writes against the API server.

use crate::constants::OPERATOR_NAME;
use crate::error::{ControllerError, Result};
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Client, Resource,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt::Debug;
use std::future::Future;
use tracing::{debug, instrument};

/// Get and update objects of one kind.
///
/// Writes carry the object's resourceVersion, so the server rejects stale
/// updates with a conflict. Callers treat that like any other transient error.
pub trait ObjectStore<K>: Send + Sync + 'static {
    fn get(&self, namespace: &str, name: &str) -> impl Future<Output = Result<K>> + Send;

    fn update(&self, obj: &K) -> impl Future<Output = Result<K>> + Send;

    /// Write only the status subresource of `obj`
    fn update_status(&self, obj: &K) -> impl Future<Output = Result<K>> + Send;
}

/// [`ObjectStore`] backed by a kube [`Client`]
pub struct KubeStore<K> {
    client: Client,
    api: fn(Client, &str) -> Api<K>,
}

impl<K> Clone for KubeStore<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api: self.api,
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    pub fn namespaced(client: Client) -> Self {
        Self {
            client,
            api: |client, namespace| Api::namespaced(client, namespace),
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = (), Scope = ClusterResourceScope>,
{
    pub fn cluster(client: Client) -> Self {
        Self {
            client,
            api: |client, _| Api::all(client),
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = ()>,
{
    fn api_for(&self, obj: &K) -> Result<(Api<K>, String)> {
        let meta = obj.meta();
        let name = meta
            .name
            .clone()
            .ok_or_else(|| ControllerError::InvalidObject(format!("{} without a name", K::kind(&()))))?;
        let namespace = meta.namespace.as_deref().unwrap_or_default();
        Ok(((self.api)(self.client.clone(), namespace), name))
    }
}

fn write_params() -> PostParams {
    PostParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    }
}

impl<K> ObjectStore<K> for KubeStore<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Serialize + Debug + Send + Sync + 'static,
{
    #[instrument(skip(self), fields(kind = %K::kind(&())))]
    async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        let api = (self.api)(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    #[instrument(skip(self, obj), fields(kind = %K::kind(&()), name = ?obj.meta().name))]
    async fn update(&self, obj: &K) -> Result<K> {
        let (api, name) = self.api_for(obj)?;
        let updated = api.replace(&name, &write_params(), obj).await?;
        debug!("Updated {}", name);
        Ok(updated)
    }

    #[instrument(skip(self, obj), fields(kind = %K::kind(&()), name = ?obj.meta().name))]
    async fn update_status(&self, obj: &K) -> Result<K> {
        let (api, name) = self.api_for(obj)?;
        let value = serde_json::to_value(obj)?;
        let patch = json!({
            "metadata": { "resourceVersion": obj.meta().resource_version },
            "status": value.get("status"),
        });
        let pp = PatchParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };
        let updated = api.patch_status(&name, &pp, &Patch::Merge(&patch)).await?;
        debug!("Updated status of {}", name);
        Ok(updated)
    }
}
