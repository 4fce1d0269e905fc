// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event filters deciding which watch events reach the work queue.

use std::sync::Arc;

pub type ObjectPredicate<K> = Arc<dyn Fn(&K) -> bool + Send + Sync>;
pub type UpdatePredicate<K> = Arc<dyn Fn(&K, &K) -> bool + Send + Sync>;

/// Predicates over watch events.
///
/// An unset `add_func` or `update_func` lets every add or update through.
/// Deletions are dropped unless `delete_func` is set.
pub struct FilterFuncs<K> {
    pub add_func: Option<ObjectPredicate<K>>,
    /// Receives `(old, new)`
    pub update_func: Option<UpdatePredicate<K>>,
    pub delete_func: Option<ObjectPredicate<K>>,
}

impl<K> FilterFuncs<K> {
    pub fn new() -> Self {
        Self {
            add_func: None,
            update_func: None,
            delete_func: None,
        }
    }

    pub fn with_add<F>(mut self, f: F) -> Self
    where
        F: Fn(&K) -> bool + Send + Sync + 'static,
    {
        self.add_func = Some(Arc::new(f));
        self
    }

    pub fn with_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, &K) -> bool + Send + Sync + 'static,
    {
        self.update_func = Some(Arc::new(f));
        self
    }

    pub fn with_delete<F>(mut self, f: F) -> Self
    where
        F: Fn(&K) -> bool + Send + Sync + 'static,
    {
        self.delete_func = Some(Arc::new(f));
        self
    }

    pub fn accept_add(&self, obj: &K) -> bool {
        self.add_func.as_ref().is_none_or(|f| f(obj))
    }

    pub fn accept_update(&self, old: &K, new: &K) -> bool {
        self.update_func.as_ref().is_none_or(|f| f(old, new))
    }

    pub fn accept_delete(&self, obj: &K) -> bool {
        self.delete_func.as_ref().is_some_and(|f| f(obj))
    }
}

impl<K> Default for FilterFuncs<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for FilterFuncs<K> {
    fn clone(&self) -> Self {
        Self {
            add_func: self.add_func.clone(),
            update_func: self.update_func.clone(),
            delete_func: self.delete_func.clone(),
        }
    }
}
