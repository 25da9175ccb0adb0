// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ingress-nginx controller as a DaemonSet behind a fixed LoadBalancer address

use tracing::info;

use super::{show_state, HelmRelease};
use crate::constants::ingress::{
    CHART, LOAD_BALANCER_IP, NAMESPACE, RELEASE, REPO_NAME, REPO_URL, VERSION,
};
use crate::error::Result;
use crate::process::{CommandRunner, Invocation};

pub fn release() -> HelmRelease {
    HelmRelease::new(RELEASE, CHART, NAMESPACE, VERSION)
        .repository(REPO_NAME, REPO_URL)
        .set("controller.kind", "DaemonSet")
        .set("controller.service.loadBalancerIP", LOAD_BALANCER_IP)
        .set("controller.progressDeadlineSeconds", "null")
        .create_namespace()
}

pub async fn install(runner: &dyn CommandRunner) -> Result<()> {
    info!("Installing ingress-nginx...");
    release().install(runner).await?;
    info!("ingress-nginx installed");
    Ok(())
}

pub async fn verify(runner: &dyn CommandRunner) -> Result<()> {
    info!("Verifying ingress-nginx installation...");
    show_state(
        runner,
        Invocation::kubectl(["get", "pods", "-n", NAMESPACE]),
        &[
            Invocation::kubectl(["get", "service", "-n", NAMESPACE]),
            Invocation::kubectl(["get", "ingressclass"]),
        ],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_values() {
        let inv = release().upgrade_install();

        assert!(inv.args_are(&[
            "upgrade",
            "--install",
            "ingress-nginx",
            "ingress-nginx/ingress-nginx",
            "--namespace",
            "ingress-nginx",
            "--version",
            "4.13.3",
            "--create-namespace",
            "--set",
            "controller.kind=DaemonSet",
            "--set",
            "controller.service.loadBalancerIP=192.168.0.180",
            "--set",
            "controller.progressDeadlineSeconds=null",
        ]));
    }
}
