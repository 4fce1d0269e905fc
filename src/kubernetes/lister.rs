// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Synchronous reads from an informer cache.

use crate::controller::ObjectKey;
use crate::error::{ControllerError, Result};
use kube::runtime::reflector::{ObjectRef, Store};
use kube::Resource;
use std::sync::Arc;

/// Read-through cache lookup. A miss is reported as a not-found error.
pub trait Lister<K>: Send + Sync + 'static {
    fn get_cached(&self, namespace: &str, name: &str) -> Result<Arc<K>>;
}

impl<K> Lister<K> for Store<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn get_cached(&self, namespace: &str, name: &str) -> Result<Arc<K>> {
        let mut obj_ref = ObjectRef::<K>::new(name);
        if !namespace.is_empty() {
            obj_ref = obj_ref.within(namespace);
        }
        Store::get(self, &obj_ref)
            .ok_or_else(|| ControllerError::not_found(K::kind(&()), ObjectKey::new(namespace, name)))
    }
}
