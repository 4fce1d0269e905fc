// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes collaborators: cached reads, API server writes and CRD discovery.

pub mod crd;
pub mod lister;
pub mod store;

pub use crd::wait_for_crd;
pub use lister::Lister;
pub use store::{KubeStore, ObjectStore};
