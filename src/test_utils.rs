// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked API server and in-memory store collaborators.

use crate::controller::ObjectKey;
use crate::error::{ControllerError, Result};
use crate::kubernetes::{Lister, ObjectStore};
use http::{Request, Response};
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, Resource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Method and path of every request received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Try prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("object", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

pub fn configmap_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "8"
        }
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a 409 conflict response as returned for stale writes
pub fn conflict_json(resource: &str, name: &str) -> String {
    status_json(
        409,
        "Conflict",
        &format!(
            "Operation cannot be fulfilled on {} \"{}\": the object has been modified",
            resource, name
        ),
    )
}

fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

pub fn server_error(message: &str) -> ControllerError {
    ControllerError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

struct FakeState<K> {
    objects: HashMap<ObjectKey, K>,
    get_errors: HashMap<ObjectKey, String>,
    update_error: Option<String>,
    gets: Vec<ObjectKey>,
    updates: Vec<K>,
    status_updates: Vec<K>,
}

/// In-memory [`ObjectStore`] recording every call. Clones share state.
pub struct FakeStore<K> {
    state: Arc<Mutex<FakeState<K>>>,
}

impl<K> Clone for FakeStore<K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<K: Resource + Clone> FakeStore<K> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                objects: HashMap::new(),
                get_errors: HashMap::new(),
                update_error: None,
                gets: Vec::new(),
                updates: Vec::new(),
                status_updates: Vec::new(),
            })),
        }
    }

    pub fn with_object(self, obj: K) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(ObjectKey::from_object(&obj), obj);
        self
    }

    /// Make `get` of the given identity fail with a server error
    pub fn with_get_error(self, namespace: &str, name: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .get_errors
            .insert(ObjectKey::new(namespace, name), message.to_string());
        self
    }

    /// Make every update and status update fail with a server error
    pub fn with_update_error(self, message: &str) -> Self {
        self.state.lock().unwrap().update_error = Some(message.to_string());
        self
    }

    pub fn gets(&self) -> Vec<ObjectKey> {
        self.state.lock().unwrap().gets.clone()
    }

    pub fn updates(&self) -> Vec<K> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn status_updates(&self) -> Vec<K> {
        self.state.lock().unwrap().status_updates.clone()
    }
}

impl<K: Resource + Clone> Default for FakeStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ObjectStore<K> for FakeStore<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        let key = ObjectKey::new(namespace, name);
        let mut state = self.state.lock().unwrap();
        state.gets.push(key.clone());
        if let Some(message) = state.get_errors.get(&key) {
            return Err(server_error(message));
        }
        state
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| ControllerError::not_found("Object", key))
    }

    async fn update(&self, obj: &K) -> Result<K> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.update_error {
            return Err(server_error(message));
        }
        state.updates.push(obj.clone());
        state.objects.insert(ObjectKey::from_object(obj), obj.clone());
        Ok(obj.clone())
    }

    async fn update_status(&self, obj: &K) -> Result<K> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.update_error {
            return Err(server_error(message));
        }
        state.status_updates.push(obj.clone());
        state.objects.insert(ObjectKey::from_object(obj), obj.clone());
        Ok(obj.clone())
    }
}

/// Fixed [`Lister`] contents
pub struct StaticLister<K> {
    objects: HashMap<ObjectKey, Arc<K>>,
}

impl<K: Resource> StaticLister<K> {
    pub fn new(objects: Vec<K>) -> Self {
        Self {
            objects: objects
                .into_iter()
                .map(|obj| (ObjectKey::from_object(&obj), Arc::new(obj)))
                .collect(),
        }
    }
}

impl<K> Lister<K> for StaticLister<K>
where
    K: Resource + Send + Sync + 'static,
{
    fn get_cached(&self, namespace: &str, name: &str) -> Result<Arc<K>> {
        let key = ObjectKey::new(namespace, name);
        self.objects
            .get(&key)
            .cloned()
            .ok_or_else(|| ControllerError::not_found("Object", key))
    }
}
