// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster add-ons: one module per add-on, each with an install and a verify step.
//!
//! Install steps fail on the first error. Verify steps only display cluster state;
//! callers decide whether their failure matters.

pub mod argocd;
pub mod cert_manager;
pub mod eso;
pub mod helm;
pub mod ingress;
pub mod metallb;
pub mod metrics;

use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::process::{CommandRunner, Invocation};

/// A chart installed with `helm upgrade --install`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmRelease {
    pub repo_name: String,
    pub repo_url: String,
    pub release: String,
    pub chart: String,
    pub namespace: String,
    pub version: String,
    pub create_namespace: bool,
    pub values_url: Option<String>,
    pub set_values: Vec<(String, String)>,
}

impl HelmRelease {
    pub fn new(release: &str, chart: &str, namespace: &str, version: &str) -> Self {
        Self {
            repo_name: String::new(),
            repo_url: String::new(),
            release: release.to_string(),
            chart: chart.to_string(),
            namespace: namespace.to_string(),
            version: version.to_string(),
            create_namespace: false,
            values_url: None,
            set_values: Vec::new(),
        }
    }

    pub fn repository(mut self, name: &str, url: &str) -> Self {
        self.repo_name = name.to_string();
        self.repo_url = url.to_string();
        self
    }

    pub fn create_namespace(mut self) -> Self {
        self.create_namespace = true;
        self
    }

    pub fn values_url(mut self, url: &str) -> Self {
        self.values_url = Some(url.to_string());
        self
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.set_values.push((key.to_string(), value.to_string()));
        self
    }

    pub fn repo_add(&self) -> Invocation {
        Invocation::helm(["repo", "add", self.repo_name.as_str(), self.repo_url.as_str()])
    }

    pub fn repo_update(&self) -> Invocation {
        Invocation::helm(["repo", "update"])
    }

    pub fn upgrade_install(&self) -> Invocation {
        let mut inv = Invocation::helm([
            "upgrade",
            "--install",
            self.release.as_str(),
            self.chart.as_str(),
            "--namespace",
            self.namespace.as_str(),
            "--version",
            self.version.as_str(),
        ]);
        if self.create_namespace {
            inv = inv.arg("--create-namespace");
        }
        if let Some(url) = &self.values_url {
            inv = inv.args(["--values", url.as_str()]);
        }
        for (key, value) in &self.set_values {
            inv = inv.args(["--set".to_string(), format!("{}={}", key, value)]);
        }
        inv
    }

    /// Register the repository, refresh indices and install or upgrade the release
    #[instrument(skip(self, runner), fields(release = %self.release))]
    pub async fn install(&self, runner: &dyn CommandRunner) -> Result<()> {
        info!("Adding Helm repository {}...", self.repo_name);
        runner.run(&self.repo_add()).await?;
        runner.run(&self.repo_update()).await?;

        info!(
            "Installing chart {} {} into {}...",
            self.chart, self.version, self.namespace
        );
        runner.run(&self.upgrade_install()).await
    }
}

/// `kubectl apply -f <url>`
pub async fn apply_manifest(runner: &dyn CommandRunner, url: &str) -> Result<()> {
    runner.run(&Invocation::kubectl(["apply", "-f", url])).await
}

/// Display cluster state: `primary` must succeed, each of `extra` only warns
pub async fn show_state(
    runner: &dyn CommandRunner,
    primary: Invocation,
    extra: &[Invocation],
) -> Result<()> {
    runner.run(&primary).await?;
    for command in extra {
        if let Err(e) = runner.run(command).await {
            warn!("Failed to display `{}`: {}", command, e);
        }
    }
    Ok(())
}
