// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Concrete controllers built on the reconciliation engine.

pub mod configmap_cabundle;
pub mod service_ca;

pub use configmap_cabundle::{new_configmap_cabundle_controller, ConfigMapCABundleInjector};
pub use service_ca::{new_service_ca_status_controller, ServiceCAStatusSyncer};
