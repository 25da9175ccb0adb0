// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provisioning of the cluster and its add-ons, in dependency order

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use kube::Client;
use tracing::{info, warn};

use crate::addons::{argocd, cert_manager, eso, helm, ingress, metallb, metrics};
use crate::cluster::{self, ClusterConnector};
use crate::config::Config;
use crate::connectivity;
use crate::constants::colima::K3S_READY_TIMEOUT;
use crate::error::Result;
use crate::process::{CommandRunner, Invocation};
use crate::prompt::{AccessToken, Prompter};
use crate::workflow::Workflow;

/// Operator input gathered before anything is touched
#[derive(Debug)]
pub struct Answers {
    pub env_label: String,
    pub token: AccessToken,
}

impl Answers {
    pub fn collect<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<Self> {
        let env_label = prompter.environment_label()?;
        let token = prompter.access_token()?;
        Ok(Self { env_label, token })
    }
}

pub struct Installer {
    config: Config,
    runner: Arc<dyn CommandRunner>,
    connector: Arc<dyn ClusterConnector>,
    work_dir: PathBuf,
}

impl Installer {
    pub fn new(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        connector: Arc<dyn ClusterConnector>,
    ) -> Self {
        Self {
            config,
            runner,
            connector,
            work_dir: PathBuf::from("."),
        }
    }

    /// Prompt for input, then provision everything. Stops at the first failed
    /// required step; failed verifications are summarized at the end.
    pub async fn run<R: BufRead, W: Write>(&self, prompter: &mut Prompter<R, W>) -> Result<()> {
        let answers = Answers::collect(prompter)?;
        info!("Using environment label '{}'", answers.env_label);

        let runner = self.runner.as_ref();
        let mut wf = Workflow::new();

        wf.required("Prerequisites", async {
            cluster::validate_prerequisites(runner)
        })
        .await?;
        wf.required("Colima", cluster::ensure_colima_installed(runner))
            .await?;
        let client = wf.required("K3s cluster", self.provision_cluster()).await?;

        wf.best_effort("metrics-server", metrics::install(runner))
            .await;
        wf.required(
            "Post-install configuration",
            self.post_install(&client, &answers.env_label),
        )
        .await?;

        wf.required("Helm", helm::install(runner, &self.work_dir))
            .await?;
        wf.best_effort("Helm verification", helm::verify(runner)).await;

        wf.required("MetalLB", metallb::install(runner)).await?;
        wf.best_effort("MetalLB verification", metallb::verify(runner))
            .await;

        wf.required("ingress-nginx", ingress::install(runner)).await?;
        wf.best_effort("ingress-nginx verification", ingress::verify(runner))
            .await;
        wf.critical(
            "Ingress connectivity",
            connectivity::verify_ingress_connectivity(&client, runner),
        )
        .await?;

        wf.required("External Secrets Operator", eso::install(runner))
            .await?;
        wf.best_effort("External Secrets Operator verification", eso::verify(runner))
            .await;

        wf.required(
            "Secret store",
            eso::install_secret_store(&client, runner, &answers.token),
        )
        .await?;
        wf.best_effort("Secret store verification", eso::verify_secret_store(runner))
            .await;

        wf.required("cert-manager", cert_manager::install(runner))
            .await?;
        wf.best_effort("cert-manager verification", cert_manager::verify(runner))
            .await;

        wf.required("Argo CD", argocd::install(&client, runner))
            .await?;
        wf.best_effort("Argo CD verification", argocd::verify(runner))
            .await;

        wf.best_effort("Final verification", self.final_verification())
            .await;

        wf.log_summary("Installation");
        Ok(())
    }

    /// Replace any previous instance with a fresh VM and wait for its API server
    async fn provision_cluster(&self) -> Result<Client> {
        let runner = self.runner.as_ref();
        cluster::stop_existing(runner, &self.config.profile).await;
        cluster::start_with_k3s(runner, &self.config).await?;
        self.connector.wait_until_ready(K3S_READY_TIMEOUT).await
    }

    async fn post_install(&self, client: &Client, env_label: &str) -> Result<()> {
        cluster::disable_traefik(self.runner.as_ref()).await;
        cluster::label_node(client, env_label).await
    }

    async fn final_verification(&self) -> Result<()> {
        let runner = self.runner.as_ref();
        info!("Running final verification...");

        runner
            .run(&Invocation::kubectl(["get", "nodes", "--show-labels"]))
            .await?;
        if let Err(e) = runner
            .run(&Invocation::kubectl(["get", "pods", "--all-namespaces"]))
            .await
        {
            warn!("Failed to list pods: {}", e);
        }
        if let Err(e) = cluster::test_kubectl_access(runner).await {
            warn!("kubectl access check failed: {}", e);
        }

        match cluster::instance_address(runner, &self.config.profile).await {
            Ok(Some(address)) => info!("Colima VM address: {}", address),
            Ok(None) => warn!("Colima VM has no network address"),
            Err(e) => warn!("Failed to look up the Colima VM address: {}", e),
        }
        Ok(())
    }
}
