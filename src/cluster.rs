// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Colima VM lifecycle and the K3s cluster it hosts

use async_trait::async_trait;
use kube::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::constants::{colima, traefik};
use crate::error::{HomeserverError, Result};
use crate::kubernetes;
use crate::process::{CommandRunner, Invocation};

/// One entry of `colima list --json`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ColimaInstance {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub address: String,
}

impl ColimaInstance {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("running")
    }

    /// Address on the bridged network, if the VM has one
    pub fn address(&self) -> Option<&str> {
        Some(self.address.trim()).filter(|a| !a.is_empty())
    }
}

/// Parse `colima list --json` output, one JSON object per line
pub fn parse_instances(output: &str) -> Vec<ColimaInstance> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(instance) => Some(instance),
            Err(e) => {
                warn!("Ignoring unparsable colima list entry: {}", e);
                None
            }
        })
        .collect()
}

/// Fail early when Homebrew, needed to install Colima, is missing
pub fn validate_prerequisites(runner: &dyn CommandRunner) -> Result<()> {
    info!("Checking prerequisites...");
    if !runner.is_available("brew") {
        return Err(HomeserverError::MissingPrerequisite {
            tool: "brew".to_string(),
            hint: "install Homebrew from https://brew.sh".to_string(),
        });
    }
    info!("Prerequisites satisfied");
    Ok(())
}

/// Install Colima through Homebrew unless it is already on the path
pub async fn ensure_colima_installed(runner: &dyn CommandRunner) -> Result<()> {
    if runner.is_available("colima") {
        info!("Colima is already installed");
        return Ok(());
    }
    info!("Installing Colima...");
    runner
        .run(&Invocation::new("brew").args(["install", "colima"]))
        .await
}

/// True when Colima knows the profile; any failure reads as absent
pub async fn instance_exists(runner: &dyn CommandRunner, profile: &str) -> bool {
    runner
        .output(&Invocation::new("colima").args(["status", profile]))
        .await
        .is_ok()
}

pub async fn stop_instance(runner: &dyn CommandRunner, profile: &str) -> Result<()> {
    runner
        .run(&Invocation::new("colima").args(["stop", profile]))
        .await
}

pub async fn delete_instance(runner: &dyn CommandRunner, profile: &str) -> Result<()> {
    runner
        .run(&Invocation::new("colima").args(["delete", profile, "--force"]))
        .await
}

/// Stop and delete a previous instance of the profile so the cluster starts clean.
///
/// Stop and delete failures are logged and do not abort.
#[instrument(skip(runner))]
pub async fn stop_existing(runner: &dyn CommandRunner, profile: &str) {
    if !instance_exists(runner, profile).await {
        info!("No existing Colima instance {}", profile);
        return;
    }

    info!("Stopping existing Colima instance {}...", profile);
    if let Err(e) = stop_instance(runner, profile).await {
        warn!("Failed to stop Colima instance {}: {}", profile, e);
    }
    if let Err(e) = delete_instance(runner, profile).await {
        warn!("Failed to delete Colima instance {}: {}", profile, e);
    }
}

/// `colima start` for the configured profile with K3s enabled
pub fn start_invocation(config: &Config) -> Invocation {
    Invocation::new("colima")
        .args(["start", config.profile.as_str()])
        .args(["--cpu".to_string(), config.cpus.to_string()])
        .args(["--memory".to_string(), config.memory_gib.to_string()])
        .args(["--runtime", colima::RUNTIME])
        .arg("--network-address")
        .args(["--network-mode", colima::NETWORK_MODE])
        .args(["--network-interface", config.network_interface.as_str()])
        .arg("--kubernetes")
        .timeout(colima::START_TIMEOUT)
}

#[instrument(skip(runner, config), fields(profile = %config.profile))]
pub async fn start_with_k3s(runner: &dyn CommandRunner, config: &Config) -> Result<()> {
    info!(
        "Starting Colima with K3s ({} CPUs, {} GiB memory)...",
        config.cpus, config.memory_gib
    );
    runner.run(&start_invocation(config)).await?;
    info!("Colima started");
    Ok(())
}

/// Wait for K3s to serve the API and return a client connected to it
pub async fn wait_for_k3s_ready(max_wait: Duration) -> Result<Client> {
    kubernetes::wait_for_api_ready(max_wait).await
}

/// Source of the API client for a freshly started cluster
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn wait_until_ready(&self, max_wait: Duration) -> Result<Client>;
}

/// Connects through the default kubeconfig that Colima writes on start
#[derive(Debug, Default, Clone, Copy)]
pub struct KubeconfigConnector;

#[async_trait]
impl ClusterConnector for KubeconfigConnector {
    async fn wait_until_ready(&self, max_wait: Duration) -> Result<Client> {
        wait_for_k3s_ready(max_wait).await
    }
}

/// Remove the bundled Traefik ingress; ingress-nginx takes its place.
///
/// Failures are informational since a cluster without Traefik is the goal.
pub async fn disable_traefik(runner: &dyn CommandRunner) {
    info!("Disabling Traefik...");
    let removals = [
        Invocation::kubectl([
            "delete",
            "namespace",
            traefik::NAMESPACE,
            "--ignore-not-found",
        ]),
        Invocation::kubectl([
            "delete",
            "ingressclass",
            traefik::INGRESS_CLASS,
            "--ignore-not-found",
        ]),
    ];
    for removal in &removals {
        if let Err(e) = runner.run(removal).await {
            info!("Traefik cleanup skipped: {}", e);
        }
    }
}

/// Label the node with the environment label, overwriting a previous one
pub async fn label_node(client: &Client, env_label: &str) -> Result<()> {
    kubernetes::label_first_node(client, env_label).await?;
    Ok(())
}

/// Bridged address of the profile's VM, `None` when it has none yet
pub async fn instance_address(runner: &dyn CommandRunner, profile: &str) -> Result<Option<String>> {
    let output = runner
        .output(&Invocation::new("colima").args(["list", "--json"]))
        .await?;
    Ok(parse_instances(&output)
        .into_iter()
        .find(|instance| instance.name == profile)
        .and_then(|instance| {
            if !instance.is_running() {
                warn!("Colima instance {} is {}", profile, instance.status);
            }
            instance.address().map(str::to_string)
        }))
}

/// Show kubectl client version and cluster endpoints
pub async fn test_kubectl_access(runner: &dyn CommandRunner) -> Result<()> {
    runner
        .run(&Invocation::kubectl(["version", "--client"]))
        .await?;
    runner.run(&Invocation::kubectl(["cluster-info"])).await
}
