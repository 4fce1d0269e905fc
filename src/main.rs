// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use service_ca_controller::config::Config;
use service_ca_controller::kubernetes::wait_for_crd;
use service_ca_controller::reconcilers::{
    new_configmap_cabundle_controller, new_service_ca_status_controller,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting service CA controllers");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: target_namespace={}, managed_deployments={:?}, workers={}",
        config.target_namespace, config.managed_deployments, config.workers
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // The status controller watches ServiceCA objects, which need the CRD
    info!("Waiting for ServiceCA CRD to become available...");
    wait_for_crd(&client, "operator.openshift.io", "v1", "ServiceCA").await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        signal_token.cancel();
    });

    let injector = new_configmap_cabundle_controller(client.clone(), config.ca_bundle.clone());
    let status = new_service_ca_status_controller(client, &config);

    info!("Starting controllers...");
    tokio::try_join!(
        injector.run(config.workers, shutdown.clone()),
        status.run(config.workers, shutdown.clone())
    )?;

    info!("All controllers stopped");
    Ok(())
}
