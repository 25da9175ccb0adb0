// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Teardown of the VM, Helm and the per-user state left behind

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::cluster;
use crate::config::Config;
use crate::constants::{cleanup, helm};
use crate::error::{HomeserverError, Result};
use crate::process::{CommandRunner, Invocation};
use crate::workflow::Workflow;

/// Remove a file or directory tree. Returns `false` when nothing was there.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(true)
}

/// Remove each path that exists, logging failures. Returns the number of failures.
async fn remove_all_logged(paths: &[PathBuf]) -> usize {
    let mut failures = 0;
    for path in paths {
        match remove_if_exists(path).await {
            Ok(true) => info!("Removed {}", path.display()),
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }
    failures
}

pub struct Uninstaller {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    helm_binaries: Vec<PathBuf>,
}

impl Uninstaller {
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            helm_binaries: helm::SYSTEM_BINARIES.iter().map(PathBuf::from).collect(),
        }
    }

    /// Override the system-wide Helm binary locations
    pub fn with_helm_binaries(mut self, paths: Vec<PathBuf>) -> Self {
        self.helm_binaries = paths;
        self
    }

    fn home(&self) -> Result<&Path> {
        self.config.home_dir.as_deref().ok_or_else(|| {
            HomeserverError::InvalidInput("failed to resolve the home directory".to_string())
        })
    }

    /// Tear everything down. Only an unresolvable home directory is fatal.
    pub async fn run(&self) -> Result<()> {
        let runner = self.runner.as_ref();
        let profile = self.config.profile.as_str();
        let mut wf = Workflow::new();

        info!("Stopping Colima instance {}...", profile);
        wf.best_effort("Stop Colima", cluster::stop_instance(runner, profile))
            .await;
        info!("Deleting Colima instance {}...", profile);
        wf.best_effort("Delete Colima", cluster::delete_instance(runner, profile))
            .await;

        wf.best_effort("Uninstall Helm", self.uninstall_helm()).await;
        wf.required("Clean up directories", self.cleanup_directories())
            .await?;
        wf.best_effort("Clean kubectl config", self.clean_kubeconfig())
            .await;

        info!("No additional processes to clean up, Colima stops its own");

        info!("Cleaning Homebrew cache...");
        wf.best_effort(
            "Homebrew cleanup",
            runner.run(&Invocation::new("brew").arg("cleanup")),
        )
        .await;

        wf.log_summary("Uninstallation");
        Ok(())
    }

    /// Remove Helm binaries and its configuration and cache directories
    pub async fn uninstall_helm(&self) -> Result<()> {
        info!("Uninstalling Helm...");
        let mut binaries = self.helm_binaries.clone();
        let mut dirs = Vec::new();
        match self.home() {
            Ok(home) => {
                binaries.push(home.join(helm::HOME_BINARY));
                dirs.extend(helm::HOME_DIRS.iter().map(|d| home.join(d)));
            }
            Err(e) => warn!("Skipping per-user Helm files: {}", e),
        }

        remove_all_logged(&binaries).await;
        remove_all_logged(&dirs).await;

        if self.runner.is_available("helm") {
            warn!("Helm is still available on PATH; restart the shell or remove it manually");
        } else {
            info!("Helm removed from the system");
        }
        Ok(())
    }

    /// Remove `~/.kube` and `~/.colima`; individual failures only warn
    pub async fn cleanup_directories(&self) -> Result<()> {
        info!("Cleaning up remaining files...");
        let home = self.home()?;
        let dirs = [cleanup::KUBE_DIR, cleanup::COLIMA_DIR].map(|d| home.join(d));
        remove_all_logged(&dirs).await;
        Ok(())
    }

    pub async fn clean_kubeconfig(&self) -> Result<()> {
        info!("Cleaning kubectl configuration...");
        let kube_dir = self.home()?.join(cleanup::KUBE_DIR);
        remove_if_exists(&kube_dir).await?;
        Ok(())
    }
}
