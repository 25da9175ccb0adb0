// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External Secrets Operator and the GitLab-backed ClusterSecretStore

use kube::Client;
use tracing::{info, instrument};

use super::{apply_manifest, show_state, HelmRelease};
use crate::constants::eso::{
    CHART, CLUSTER_SECRET_STORE_URL, NAMESPACE, RELEASE, REPO_NAME, REPO_URL, TOKEN_KEY,
    TOKEN_SECRET, VERSION,
};
use crate::constants::poll::POD_READY_TIMEOUT;
use crate::error::Result;
use crate::kubernetes::apply_single_key_secret;
use crate::poll::{wait_for_pods_ready, ReadinessCondition};
use crate::process::{CommandRunner, Invocation};
use crate::prompt::AccessToken;

pub fn release() -> HelmRelease {
    HelmRelease::new(RELEASE, CHART, NAMESPACE, VERSION)
        .repository(REPO_NAME, REPO_URL)
        .create_namespace()
}

/// Install the operator chart and wait for every pod in its namespace
pub async fn install(runner: &dyn CommandRunner) -> Result<()> {
    info!("Installing External Secrets Operator...");
    release().install(runner).await?;
    wait_for_pods_ready(runner, &ReadinessCondition::all(NAMESPACE, POD_READY_TIMEOUT)).await?;
    info!("External Secrets Operator installed");
    Ok(())
}

pub async fn verify(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying External Secrets Operator installation...");
    show_state(
        runner,
        Invocation::kubectl(["get", "pods", "-n", NAMESPACE]),
        &[],
    )
    .await
}

/// Store the access token, then the ClusterSecretStore that reads it.
///
/// The store references the secret, so the secret goes first.
#[instrument(skip_all)]
pub async fn install_secret_store(
    client: &Client,
    runner: &dyn CommandRunner,
    token: &AccessToken,
) -> Result<()> {
    info!("Creating secret {}/{}...", NAMESPACE, TOKEN_SECRET);
    apply_single_key_secret(client, NAMESPACE, TOKEN_SECRET, TOKEN_KEY, token.expose()).await?;

    info!("Applying GitLab ClusterSecretStore...");
    apply_manifest(runner, CLUSTER_SECRET_STORE_URL).await?;
    info!("Secret store configured");
    Ok(())
}

pub async fn verify_secret_store(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying secret store...");
    show_state(
        runner,
        Invocation::kubectl(["get", "secret", TOKEN_SECRET, "-n", NAMESPACE]),
        &[Invocation::kubectl(["get", "clustersecretstore"])],
    )
    .await
}
