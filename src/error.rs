// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("{kind} {key} not found")]
    NotFound { kind: String, key: String },

    #[error("Serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid object: {0}")]
    InvalidObject(String),
}

impl ControllerError {
    pub fn not_found(kind: impl Into<String>, key: impl ToString) -> Self {
        ControllerError::NotFound {
            kind: kind.into(),
            key: key.to_string(),
        }
    }

    /// True for cache misses and for 404 responses from the API server
    pub fn is_not_found(&self) -> bool {
        match self {
            ControllerError::NotFound { .. } => true,
            ControllerError::KubeError(kube::Error::Api(err)) => err.code == 404,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
