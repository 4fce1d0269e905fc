// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::types::conditions::OperatorCondition;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operator.openshift.io", version = "v1", kind = "ServiceCA")]
#[kube(status = "ServiceCAStatus")]
#[serde(rename_all = "camelCase")]
pub struct ServiceCASpec {
    /// "Managed", "Unmanaged" or "Removed"; absent means managed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_state: Option<String>,
}

impl ServiceCA {
    /// Whether the operator should drive this config at all
    pub fn is_managed(&self) -> bool {
        self.spec
            .management_state
            .as_deref()
            .is_none_or(|s| s == "Managed")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCAStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<OperatorCondition>,
    /// Operand version, only written once the rollout allows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
