// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;

const DEFAULT_TARGET_NAMESPACE: &str = "openshift-service-ca";
const DEFAULT_OPERATOR_CONFIG_NAME: &str = "cluster";
const DEFAULT_MANAGED_DEPLOYMENTS: &str = "service-serving-cert-signer,configmap-cabundle-injector";
const DEFAULT_WORKERS: usize = 5;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PEM bundle injected into annotated ConfigMaps
    pub ca_bundle: String,
    /// Namespace the managed deployments live in
    pub target_namespace: String,
    /// Name of the cluster-scoped ServiceCA object
    pub operator_config_name: String,
    /// Deployments whose readiness feeds the operator conditions, in check order
    pub managed_deployments: Vec<String>,
    pub workers: usize,
    pub operator_version: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ca_bundle_file =
            lookup("CA_BUNDLE_FILE").context("CA_BUNDLE_FILE environment variable not set")?;
        let ca_bundle = std::fs::read_to_string(&ca_bundle_file)
            .with_context(|| format!("Failed to read CA bundle from {}", ca_bundle_file))?;
        if ca_bundle.trim().is_empty() {
            bail!("CA bundle file {} is empty", ca_bundle_file);
        }

        let target_namespace =
            lookup("TARGET_NAMESPACE").unwrap_or_else(|| DEFAULT_TARGET_NAMESPACE.to_string());
        let operator_config_name = lookup("OPERATOR_CONFIG_NAME")
            .unwrap_or_else(|| DEFAULT_OPERATOR_CONFIG_NAME.to_string());

        let managed_deployments: Vec<String> = lookup("MANAGED_DEPLOYMENTS")
            .unwrap_or_else(|| DEFAULT_MANAGED_DEPLOYMENTS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if managed_deployments.is_empty() {
            bail!("MANAGED_DEPLOYMENTS must name at least one deployment");
        }

        let workers = match lookup("WORKERS") {
            Some(v) => v
                .parse::<usize>()
                .with_context(|| format!("WORKERS is not a number: {}", v))?,
            None => DEFAULT_WORKERS,
        };
        if workers == 0 {
            bail!("WORKERS must be at least 1");
        }

        let operator_version =
            lookup("OPERATOR_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        Ok(Config {
            ca_bundle,
            target_namespace,
            operator_config_name,
            managed_deployments,
            workers,
            operator_version,
        })
    }
}
