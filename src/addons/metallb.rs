// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! MetalLB load balancer in native mode with a fixed address pool

use tracing::info;

use super::{apply_manifest, show_state};
use crate::constants::metallb::{manifest_url, IP_CONFIG_URL, NAMESPACE, NAMESPACE_URL, SELECTOR};
use crate::constants::poll::POD_READY_TIMEOUT;
use crate::error::Result;
use crate::poll::{wait_for_pods_ready, ReadinessCondition};
use crate::process::{CommandRunner, Invocation};

/// Apply namespace and native manifests, wait for the speakers and controller,
/// then apply the address pool which needs MetalLB's webhooks to be up
pub async fn install(runner: &dyn CommandRunner) -> Result<()> {
    info!("Installing MetalLB...");
    apply_manifest(runner, NAMESPACE_URL).await?;
    apply_manifest(runner, &manifest_url()).await?;

    wait_for_pods_ready(
        runner,
        &ReadinessCondition::matching(NAMESPACE, SELECTOR, POD_READY_TIMEOUT),
    )
    .await?;

    info!("Configuring MetalLB address pool...");
    apply_manifest(runner, IP_CONFIG_URL).await?;
    info!("MetalLB installed");
    Ok(())
}

pub async fn verify(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying MetalLB installation...");
    show_state(
        runner,
        Invocation::kubectl(["get", "pods", "-n", NAMESPACE]),
        &[Invocation::kubectl(["get", "ipaddresspool", "-n", NAMESPACE])],
    )
    .await
}
