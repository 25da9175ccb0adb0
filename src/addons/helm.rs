// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Helm 3 client installed with the upstream installer script

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::constants::helm::{INSTALLER_FILE, INSTALLER_TIMEOUT, INSTALLER_URL};
use crate::error::Result;
use crate::process::{CommandRunner, Invocation};

/// Location of the installer script inside `work_dir`
pub fn installer_path(work_dir: &Path) -> PathBuf {
    work_dir.join(INSTALLER_FILE)
}

/// Download and run the Helm installer, then confirm Helm can reach the cluster.
///
/// The script is removed afterwards whether or not it succeeded; failing to
/// remove it is only a warning.
#[instrument(skip(runner))]
pub async fn install(runner: &dyn CommandRunner, work_dir: &Path) -> Result<()> {
    info!("Installing Helm...");
    let script = installer_path(work_dir);
    let script_arg = script.to_string_lossy().into_owned();

    runner
        .run(&Invocation::new("curl").args(["-fsSL", "-o", script_arg.as_str(), INSTALLER_URL]))
        .await?;

    let installed = run_installer(runner, &script_arg).await;

    if let Err(e) = tokio::fs::remove_file(&script).await {
        warn!("Failed to remove {}: {}", script.display(), e);
    }
    installed?;

    info!("Checking Helm access to the cluster...");
    runner
        .run(&Invocation::helm(["list", "--all-namespaces"]))
        .await?;

    info!("Helm installed");
    Ok(())
}

async fn run_installer(runner: &dyn CommandRunner, script: &str) -> Result<()> {
    runner
        .run(&Invocation::new("chmod").args(["700", script]))
        .await?;
    runner
        .run(&Invocation::new(script).timeout(INSTALLER_TIMEOUT))
        .await
}

pub async fn verify(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying Helm installation...");
    runner.run(&Invocation::helm(["version"])).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::test_support::recording_runner;

    #[tokio::test]
    async fn test_install_sequence_and_script_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let script = installer_path(dir.path());
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        let (runner, log) = recording_runner(None);

        install(&runner, dir.path()).await.unwrap();

        let script_arg = script.to_string_lossy().into_owned();
        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                format!("curl -fsSL -o {} {}", script_arg, INSTALLER_URL),
                format!("chmod 700 {}", script_arg),
                script_arg.clone(),
                "helm list --all-namespaces".to_string(),
            ]
        );
        assert!(!script.exists());
    }

    #[tokio::test]
    async fn test_installer_failure_still_removes_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = installer_path(dir.path());
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        let (runner, log) = recording_runner(Some("chmod"));

        assert!(install(&runner, dir.path()).await.is_err());

        assert!(!script.exists());
        assert!(!log
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.starts_with("helm")));
    }

    #[tokio::test]
    async fn test_missing_script_to_remove_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _log) = recording_runner(None);

        assert!(install(&runner, dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_download_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, log) = recording_runner(Some("curl"));

        assert!(install(&runner, dir.path()).await.is_err());
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
