// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ServiceCA status reconciler - keeps the operator conditions in line with its deployments.

use crate::config::Config;
use crate::constants::conditions::REASON_AS_EXPECTED;
use crate::controller::{Controller, FilterFuncs, Informer, KeySyncer, ObjectKey};
use crate::error::Result;
use crate::kubernetes::{KubeStore, Lister, ObjectStore};
use crate::status::{set_failing, sync_status};
use crate::types::conditions::conditions_equivalent;
use crate::types::{ServiceCA, ServiceCAStatus};
use k8s_openapi::api::apps::v1::Deployment;
use kube_runtime::reflector::Store;
use kube_runtime::watcher::{watcher, Config as WatcherConfig};
use kube_runtime::WatchStreamExt;
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CONTROLLER_NAME: &str = "ServiceCAStatusController";

pub struct ServiceCAStatusSyncer<L, C, D> {
    lister: L,
    configs: C,
    deployments: D,
    target_namespace: String,
    managed_deployments: Vec<String>,
    version: String,
}

impl<L, C, D> ServiceCAStatusSyncer<L, C, D>
where
    L: Lister<ServiceCA>,
    C: ObjectStore<ServiceCA>,
    D: ObjectStore<Deployment>,
{
    pub fn new(lister: L, configs: C, deployments: D, config: &Config) -> Self {
        Self {
            lister,
            configs,
            deployments,
            target_namespace: config.target_namespace.clone(),
            managed_deployments: config.managed_deployments.clone(),
            version: config.operator_version.clone(),
        }
    }
}

fn status_changed(old: &ServiceCAStatus, new: &ServiceCAStatus) -> bool {
    old.observed_generation != new.observed_generation
        || old.version != new.version
        || !conditions_equivalent(&old.conditions, &new.conditions)
}

impl<L, C, D> KeySyncer for ServiceCAStatusSyncer<L, C, D>
where
    L: Lister<ServiceCA>,
    C: ObjectStore<ServiceCA>,
    D: ObjectStore<Deployment>,
{
    type Object = ServiceCA;

    fn key(&self, namespace: &str, name: &str) -> Result<Arc<ServiceCA>> {
        self.lister.get_cached(namespace, name)
    }

    async fn sync(&self, current: Arc<ServiceCA>) -> Result<()> {
        if !current.is_managed() {
            debug!("ServiceCA {} is not managed, skipping", current.name_any());
            return Ok(());
        }

        // the only copy that gets mutated and submitted
        let mut config = (*current).clone();
        let previous = config.status.clone().unwrap_or_default();
        let mut status = previous.clone();

        let result = sync_status(
            &mut status,
            &self.deployments,
            &self.target_namespace,
            &self.managed_deployments,
        )
        .await;

        if let Ok(report_version) = result {
            set_failing(&mut status, false, REASON_AS_EXPECTED, None);
            if report_version {
                status.version = Some(self.version.clone());
            }
        }
        status.observed_generation = config.metadata.generation;

        if status_changed(&previous, &status) {
            config.status = Some(status);
            match self.configs.update_status(&config).await {
                Ok(_) => info!("Updated status of ServiceCA {}", config.name_any()),
                Err(e) if result.is_ok() => return Err(e),
                Err(e) => warn!("Failed to record failing status: {}", e),
            }
        } else {
            debug!("Status of ServiceCA {} unchanged", config.name_any());
        }

        result.map(|_| ())
    }
}

/// ServiceCA events matter for the operator's own config object when its spec changes
pub fn config_filters(config_name: String) -> FilterFuncs<ServiceCA> {
    let add_name = config_name.clone();
    FilterFuncs::new()
        .with_add(move |obj: &ServiceCA| obj.name_any() == add_name)
        .with_update(move |old: &ServiceCA, new: &ServiceCA| {
            new.name_any() == config_name && old.metadata.generation != new.metadata.generation
        })
}

/// Deployment events matter for managed deployments whose rollout state moved
pub fn deployment_filters(managed: Vec<String>) -> FilterFuncs<Deployment> {
    let managed = Arc::new(managed);
    let is_managed = move |obj: &Deployment| managed.iter().any(|n| *n == obj.name_any());
    let (on_add, on_update, on_delete) = (is_managed.clone(), is_managed.clone(), is_managed);

    FilterFuncs::new()
        .with_add(on_add)
        .with_update(move |old: &Deployment, new: &Deployment| {
            on_update(new)
                && (old.status != new.status
                    || old.metadata.generation != new.metadata.generation
                    || old.metadata.deletion_timestamp != new.metadata.deletion_timestamp)
        })
        .with_delete(on_delete)
}

pub type KubeServiceCAStatusSyncer =
    ServiceCAStatusSyncer<Store<ServiceCA>, KubeStore<ServiceCA>, KubeStore<Deployment>>;

/// Build the status controller: watches the ServiceCA config and the managed
/// deployments, and funnels both into the config's identity.
pub fn new_service_ca_status_controller(
    client: Client,
    config: &Config,
) -> Controller<KubeServiceCAStatusSyncer> {
    let configs = Informer::<ServiceCA>::new();
    let deployments = Informer::<Deployment>::new();
    let syncer = ServiceCAStatusSyncer::new(
        configs.lister(),
        KubeStore::cluster(client.clone()),
        KubeStore::namespaced(client.clone()),
        config,
    );

    let config_events =
        watcher(Api::<ServiceCA>::all(client.clone()), WatcherConfig::default()).default_backoff();
    let deployment_events = watcher(
        Api::<Deployment>::namespaced(client, &config.target_namespace),
        WatcherConfig::default(),
    )
    .default_backoff();
    let config_key = ObjectKey::cluster_scoped(config.operator_config_name.clone());

    Controller::new(CONTROLLER_NAME, syncer)
        .with_informer(
            configs,
            config_events,
            config_filters(config.operator_config_name.clone()),
        )
        .with_mapped_informer(
            deployments,
            deployment_events,
            deployment_filters(config.managed_deployments.clone()),
            move |_: &Deployment| Some(config_key.clone()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::conditions::{AVAILABLE, FAILING, PROGRESSING};
    use crate::test_utils::{FakeStore, StaticLister};
    use crate::types::conditions::find_operator_condition;
    use crate::types::{ConditionStatus, ServiceCASpec};
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    use kube::api::ObjectMeta;

    const NS: &str = "openshift-service-ca";

    fn make_config() -> Config {
        Config {
            ca_bundle: "bundle".to_string(),
            target_namespace: NS.to_string(),
            operator_config_name: "cluster".to_string(),
            managed_deployments: vec!["signer".to_string()],
            workers: 1,
            operator_version: "4.1.0".to_string(),
        }
    }

    fn make_service_ca(management_state: Option<&str>) -> ServiceCA {
        let mut obj = ServiceCA::new(
            "cluster",
            ServiceCASpec {
                management_state: management_state.map(String::from),
            },
        );
        obj.metadata.generation = Some(5);
        obj
    }

    fn make_deployment(available: i32, updated: i32, replicas: i32) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("signer".to_string()),
                namespace: Some(NS.to_string()),
                generation: Some(1),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                replicas: Some(replicas),
                updated_replicas: Some(updated),
                available_replicas: Some(available),
                observed_generation: Some(1),
                ..Default::default()
            }),
        }
    }

    type TestSyncer =
        ServiceCAStatusSyncer<StaticLister<ServiceCA>, FakeStore<ServiceCA>, FakeStore<Deployment>>;

    fn syncer(deployments: FakeStore<Deployment>) -> (TestSyncer, FakeStore<ServiceCA>) {
        let configs = FakeStore::new();
        let syncer = ServiceCAStatusSyncer::new(
            StaticLister::new(vec![make_service_ca(None)]),
            configs.clone(),
            deployments,
            &make_config(),
        );
        (syncer, configs)
    }

    fn condition_status(obj: &ServiceCA, condition_type: &str) -> ConditionStatus {
        find_operator_condition(&obj.status.as_ref().unwrap().conditions, condition_type)
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_complete_rollout_reports_version() {
        let (syncer, configs) = syncer(FakeStore::new().with_object(make_deployment(1, 1, 1)));

        syncer.sync(Arc::new(make_service_ca(None))).await.unwrap();

        let updates = configs.status_updates();
        assert_eq!(updates.len(), 1);
        let status = updates[0].status.as_ref().unwrap();
        assert_eq!(status.version.as_deref(), Some("4.1.0"));
        assert_eq!(status.observed_generation, Some(5));
        assert_eq!(condition_status(&updates[0], AVAILABLE), ConditionStatus::True);
        assert_eq!(condition_status(&updates[0], PROGRESSING), ConditionStatus::False);
        assert_eq!(condition_status(&updates[0], FAILING), ConditionStatus::False);
    }

    #[tokio::test]
    async fn test_unchanged_status_is_not_written_again() {
        let (syncer, configs) = syncer(FakeStore::new().with_object(make_deployment(1, 1, 1)));

        syncer.sync(Arc::new(make_service_ca(None))).await.unwrap();
        let written = configs.status_updates().remove(0);
        syncer.sync(Arc::new(written)).await.unwrap();

        assert_eq!(configs.status_updates().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_replicas_withhold_version() {
        let (syncer, configs) = syncer(FakeStore::new().with_object(make_deployment(1, 1, 2)));

        syncer.sync(Arc::new(make_service_ca(None))).await.unwrap();

        let updates = configs.status_updates();
        assert!(updates[0].status.as_ref().unwrap().version.is_none());
        assert_eq!(condition_status(&updates[0], AVAILABLE), ConditionStatus::True);
        assert_eq!(condition_status(&updates[0], PROGRESSING), ConditionStatus::True);
    }

    #[tokio::test]
    async fn test_fetch_error_records_failing_and_retries() {
        let deployments = FakeStore::new().with_get_error(NS, "signer", "connection refused");
        let (syncer, configs) = syncer(deployments);

        let result = syncer.sync(Arc::new(make_service_ca(None))).await;

        assert!(result.is_err());
        let updates = configs.status_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(condition_status(&updates[0], FAILING), ConditionStatus::True);
        assert_eq!(condition_status(&updates[0], AVAILABLE), ConditionStatus::False);
    }

    #[tokio::test]
    async fn test_status_write_error_is_returned() {
        let configs = FakeStore::new().with_update_error("conflict");
        let syncer = ServiceCAStatusSyncer::new(
            StaticLister::new(vec![make_service_ca(None)]),
            configs,
            FakeStore::new().with_object(make_deployment(1, 1, 1)),
            &make_config(),
        );

        assert!(syncer.sync(Arc::new(make_service_ca(None))).await.is_err());
    }

    #[tokio::test]
    async fn test_unmanaged_config_is_skipped() {
        let deployments = FakeStore::<Deployment>::new();
        let (syncer, configs) = syncer(deployments.clone());

        syncer
            .sync(Arc::new(make_service_ca(Some("Unmanaged"))))
            .await
            .unwrap();

        assert!(configs.status_updates().is_empty());
        assert!(deployments.gets().is_empty());
    }

    #[test]
    fn test_key_resolves_cluster_scoped_config() {
        let (syncer, _) = syncer(FakeStore::new());

        assert!(syncer.key("", "cluster").is_ok());
        assert!(syncer.key("", "other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_config_filters_ignore_status_only_updates() {
        let filters = config_filters("cluster".to_string());
        let old = make_service_ca(None);
        let mut status_only = old.clone();
        status_only.status = Some(ServiceCAStatus::default());
        let mut spec_change = old.clone();
        spec_change.metadata.generation = Some(6);

        assert!(filters.accept_add(&old));
        assert!(!filters.accept_add(&ServiceCA::new("other", Default::default())));
        assert!(!filters.accept_update(&old, &status_only));
        assert!(filters.accept_update(&old, &spec_change));
    }

    #[test]
    fn test_deployment_filters() {
        let filters = deployment_filters(vec!["signer".to_string()]);
        let old = make_deployment(0, 1, 1);
        let new = make_deployment(1, 1, 1);
        let mut unmanaged = new.clone();
        unmanaged.metadata.name = Some("other".to_string());

        assert!(filters.accept_add(&new));
        assert!(!filters.accept_add(&unmanaged));
        assert!(filters.accept_update(&old, &new));
        assert!(!filters.accept_update(&new, &new.clone()));
        assert!(filters.accept_delete(&new));
        assert!(!filters.accept_delete(&unmanaged));
    }
}
