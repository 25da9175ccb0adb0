// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use tracing::info;

use super::{apply_manifest, show_state};
use crate::constants::cert_manager::{
    manifest_url, CLUSTER_ISSUER_URL, NAMESPACE, ROUTE53_SECRET_URL, SELECTOR,
};
use crate::constants::poll::POD_READY_TIMEOUT;
use crate::error::Result;
use crate::poll::{wait_for_pods_ready, ReadinessCondition};
use crate::process::{CommandRunner, Invocation};

/// Install cert-manager and a Route53-backed ClusterIssuer
pub async fn install(runner: &dyn CommandRunner) -> Result<()> {
    info!("Installing cert-manager...");
    apply_manifest(runner, &manifest_url()).await?;

    wait_for_pods_ready(
        runner,
        &ReadinessCondition::matching(NAMESPACE, SELECTOR, POD_READY_TIMEOUT),
    )
    .await?;

    info!("Configuring Route53 ClusterIssuer...");
    apply_manifest(runner, ROUTE53_SECRET_URL).await?;
    apply_manifest(runner, CLUSTER_ISSUER_URL).await?;
    info!("cert-manager installed");
    Ok(())
}

pub async fn verify(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying cert-manager installation...");
    show_state(
        runner,
        Invocation::kubectl(["get", "pods", "-n", NAMESPACE]),
        &[
            Invocation::kubectl(["get", "clusterissuer"]),
            Invocation::kubectl(["get", "secret", "-n", NAMESPACE]),
        ],
    )
    .await
}
