//! Kubernetes client construction.
//!
//! Uses the in-cluster or default kubeconfig when nothing is specified, or a
//! custom kubeconfig file and/or context otherwise.

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use log::debug;
use std::path::Path;

/// Errors raised while connecting to a cluster.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Failed to create Kubernetes client: {0}")]
    ClientCreation(#[from] kube::Error),

    #[error("Failed to infer Kubernetes config: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("Failed to read kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
}

/// Build a client for the given context and kubeconfig path.
pub async fn connect(context: Option<&str>, kubeconfig: Option<&Path>) -> Result<Client, ClusterError> {
    // kube's TLS stack needs a process-wide crypto provider; ignore "already installed".
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match (context, kubeconfig) {
        (None, None) => {
            debug!("Inferring Kubernetes config");
            Config::infer().await?
        }
        (context, path) => {
            let kubeconfig = match path {
                Some(path) => {
                    debug!("Reading kubeconfig from {}", path.display());
                    Kubeconfig::read_from(path)?
                }
                None => Kubeconfig::read()?,
            };
            let options = KubeConfigOptions {
                context: context.map(str::to_string),
                ..Default::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
    };

    Ok(Client::try_from(config)?)
}
