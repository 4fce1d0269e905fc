// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator condition set: named boolean conditions with reason and message.

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperatorCondition {
    pub fn new(condition_type: &str, status: ConditionStatus, reason: &str) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status,
            last_transition_time: None,
            reason: Some(reason.to_string()),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Insert or replace a condition by type.
///
/// Replacement happens in place so the relative order of the list is kept.
/// `lastTransitionTime` only moves when the status value changes.
pub fn set_operator_condition(conditions: &mut Vec<OperatorCondition>, mut new: OperatorCondition) {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == new.condition_type)
    {
        Some(existing) => {
            if existing.status == new.status {
                new.last_transition_time = existing.last_transition_time.clone();
            } else {
                new.last_transition_time = Some(Utc::now().to_rfc3339());
            }
            *existing = new;
        }
        None => {
            new.last_transition_time = Some(Utc::now().to_rfc3339());
            conditions.push(new);
        }
    }
}

pub fn find_operator_condition<'a>(
    conditions: &'a [OperatorCondition],
    condition_type: &str,
) -> Option<&'a OperatorCondition> {
    conditions.iter().find(|c| c.condition_type == condition_type)
}

/// Compare two condition lists ignoring transition timestamps
pub fn conditions_equivalent(a: &[OperatorCondition], b: &[OperatorCondition]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.condition_type == y.condition_type
                && x.status == y.status
                && x.reason == y.reason
                && x.message == y.message
        })
}
