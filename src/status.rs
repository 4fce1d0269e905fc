// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Aggregate operator conditions from the rollout state of the managed deployments.
//!
//! Each deployment is first checked for disqualifying states (fetch failure,
//! missing, being deleted, no available replicas). The first one found ends the
//! pass with that single condition message. Otherwise deployments are counted
//! into three readiness tiers and the highest tier reached by all of them sets
//! the conditions:
//!
//! | tier           | Available | Progressing | version reported |
//! |----------------|-----------|-------------|------------------|
//! | complete       | True      | False       | yes              |
//! | version ready  | True      | True        | yes              |
//! | existing       | True      | True        | no               |

use crate::constants::conditions::*;
use crate::error::Result;
use crate::kubernetes::ObjectStore;
use crate::types::{set_operator_condition, ConditionStatus, OperatorCondition, ServiceCAStatus};
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{debug, info};

fn set_condition(
    status: &mut ServiceCAStatus,
    condition_type: &str,
    value: bool,
    reason: &str,
    message: Option<String>,
) {
    let mut condition = OperatorCondition::new(condition_type, ConditionStatus::from(value), reason);
    condition.message = message;
    set_operator_condition(&mut status.conditions, condition);
}

pub fn set_failing(status: &mut ServiceCAStatus, value: bool, reason: &str, message: Option<String>) {
    set_condition(status, FAILING, value, reason, message);
}

fn set_progressing(status: &mut ServiceCAStatus, value: bool, reason: &str, message: String) {
    set_condition(status, PROGRESSING, value, reason, Some(message));
}

fn set_available(status: &mut ServiceCAStatus, value: bool, reason: &str, message: Option<String>) {
    set_condition(status, AVAILABLE, value, reason, message);
}

/// Progressing=True and Available=False with the same explanation
fn set_not_ready(status: &mut ServiceCAStatus, message: String) {
    set_progressing(status, true, REASON_NOT_READY, message.clone());
    set_available(status, false, REASON_NOT_READY, Some(message));
}

struct Replicas {
    desired: i32,
    current: i32,
    updated: i32,
    available: i32,
    generation: i64,
    observed_generation: i64,
}

impl Replicas {
    fn of(deploy: &Deployment) -> Self {
        let status = deploy.status.as_ref();
        Self {
            desired: deploy.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1),
            current: status.and_then(|s| s.replicas).unwrap_or(0),
            updated: status.and_then(|s| s.updated_replicas).unwrap_or(0),
            available: status.and_then(|s| s.available_replicas).unwrap_or(0),
            generation: deploy.metadata.generation.unwrap_or(0),
            observed_generation: status.and_then(|s| s.observed_generation).unwrap_or(0),
        }
    }
}

pub fn is_deployment_available(deploy: &Deployment) -> bool {
    Replicas::of(deploy).available > 0
}

/// At least one replica is available and no replicas of a previous revision remain.
/// Additional replicas may still be on their way.
pub fn is_deployment_available_and_updated(deploy: &Deployment) -> bool {
    let r = Replicas::of(deploy);
    r.available > 0 && r.observed_generation >= r.generation && r.updated == r.current
}

/// Every desired replica exists, is updated and available. Desired defaults to 1.
pub fn is_deployment_complete(deploy: &Deployment) -> bool {
    let r = Replicas::of(deploy);
    r.updated == r.desired
        && r.current == r.desired
        && r.available == r.desired
        && r.observed_generation >= r.generation
}

/// Set Available/Progressing/Failing on `status` from the deployments named in
/// `deployments`, fetched fresh from `store`.
///
/// Returns `Ok(true)` when the reconciled version may be reported as active.
/// A fetch error other than not-found sets Failing=True and is returned.
pub async fn sync_status<S>(
    status: &mut ServiceCAStatus,
    store: &S,
    namespace: &str,
    deployments: &[String],
) -> Result<bool>
where
    S: ObjectStore<Deployment>,
{
    let mut existing = 0;
    let mut version_ready = 0;
    let mut complete = 0;
    let mut message = String::new();

    for name in deployments {
        let deploy = match store.get(namespace, name).await {
            Ok(deploy) => deploy,
            Err(e) if e.is_not_found() => {
                set_not_ready(status, format!("Deployment {} does not exist", name));
                return Ok(false);
            }
            Err(e) => {
                set_failing(
                    status,
                    true,
                    REASON_GET_FAILED,
                    Some(format!("Error getting deployment {}: {}", name, e)),
                );
                set_available(
                    status,
                    false,
                    REASON_NOT_READY,
                    Some(format!("Error getting deployment {}", name)),
                );
                return Err(e);
            }
        };

        if deploy.metadata.deletion_timestamp.is_some() {
            set_not_ready(status, format!("Deployment {} is being deleted", name));
            return Ok(false);
        }
        if !is_deployment_available(&deploy) {
            set_not_ready(
                status,
                format!("Deployment {} does not have available replicas", name),
            );
            return Ok(false);
        }
        existing += 1;

        if is_deployment_complete(&deploy) {
            debug!("Deployment {} has desired replicas", name);
            complete += 1;
        } else {
            message = format!("Deployment {} is creating replicas", name);
        }
        if is_deployment_available_and_updated(&deploy) {
            debug!("Deployment {} is available and updated", name);
            version_ready += 1;
        } else {
            message = format!("Deployment {} is updating", name);
        }
    }

    let total = deployments.len();
    if complete == total {
        set_available(status, true, REASON_COMPLETE, None);
        set_progressing(
            status,
            false,
            REASON_COMPLETE,
            "All managed deployments updated".to_string(),
        );
        info!("All {} managed deployments are complete", total);
        return Ok(true);
    }
    if version_ready == total {
        set_available(status, true, REASON_AVAILABLE_UPDATED, None);
        set_progressing(status, true, REASON_AVAILABLE_UPDATED, message);
        return Ok(true);
    }
    // replicas of a previous revision remain, so the version is not reported yet
    if existing == total {
        set_available(status, true, REASON_AVAILABLE, None);
        set_progressing(status, true, REASON_AVAILABLE, message);
        return Ok(false);
    }
    Ok(false)
}
