// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Argo CD with OAuth login, installed from the argo-helm chart

use kube::Client;
use tracing::{info, instrument};

use super::{apply_manifest, show_state, HelmRelease};
use crate::constants::argocd::{
    CHART, NAMESPACE, OAUTH_SECRET_URL, RELEASE, REPO_NAME, REPO_URL, SELECTOR, VALUES_URL,
    VERSION,
};
use crate::constants::poll::POD_READY_TIMEOUT;
use crate::error::Result;
use crate::kubernetes::ensure_namespace_exists;
use crate::poll::{wait_for_pods_ready, ReadinessCondition};
use crate::process::{CommandRunner, Invocation};

pub fn release() -> HelmRelease {
    HelmRelease::new(RELEASE, CHART, NAMESPACE, VERSION)
        .repository(REPO_NAME, REPO_URL)
        .create_namespace()
        .values_url(VALUES_URL)
}

/// The OAuth secret lives in the release namespace, so the namespace is
/// ensured before the chart install would create it.
#[instrument(skip_all)]
pub async fn install(client: &Client, runner: &dyn CommandRunner) -> Result<()> {
    info!("Installing Argo CD...");
    ensure_namespace_exists(client, NAMESPACE).await?;
    apply_manifest(runner, OAUTH_SECRET_URL).await?;

    release().install(runner).await?;

    wait_for_pods_ready(
        runner,
        &ReadinessCondition::matching(NAMESPACE, SELECTOR, POD_READY_TIMEOUT),
    )
    .await?;
    info!("Argo CD installed");
    Ok(())
}

pub async fn verify(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying Argo CD installation...");
    show_state(
        runner,
        Invocation::kubectl(["get", "pods", "-n", NAMESPACE]),
        &[Invocation::kubectl(["get", "service", "-n", NAMESPACE])],
    )
    .await?;

    if runner
        .run(&Invocation::kubectl(["get", "application", "-n", NAMESPACE]))
        .await
        .is_err()
    {
        info!("No Argo CD applications deployed yet");
    }
    Ok(())
}
