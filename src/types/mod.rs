// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types owned by the operator.

pub mod conditions;
pub mod service_ca;

pub use conditions::{set_operator_condition, ConditionStatus, OperatorCondition};
pub use service_ca::{ServiceCA, ServiceCASpec, ServiceCAStatus};
