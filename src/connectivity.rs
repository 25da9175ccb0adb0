// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ingress reachability: address discovery, HTTP probes and a network diagnostic sweep

use std::fmt;

use kube::Client;
use tracing::{error, info, instrument, warn};

use crate::constants::ingress::{
    ADDRESS_TIMEOUT, DIAGNOSTIC_TIMEOUT, NAMESPACE, PROBE_TIMEOUT, SELECTOR, SERVER_HEADER,
    SERVICE,
};
use crate::constants::poll::POD_READY_TIMEOUT;
use crate::error::{HomeserverError, Result};
use crate::kubernetes::wait_for_load_balancer_ip;
use crate::poll::{wait_for_pods_ready, ReadinessCondition};
use crate::process::{CommandRunner, Invocation};

/// Address the ingress controller is exposed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressEndpoint {
    pub host: String,
    pub port: u16,
}

impl IngressEndpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 80,
        }
    }

    #[cfg(test)]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// An answer comes from the controller when it identifies as nginx or is the
/// default backend's 404
pub fn classify_response(status: u16, server: Option<&str>) -> bool {
    let from_nginx = server
        .map(|s| s.to_ascii_lowercase().contains(SERVER_HEADER))
        .unwrap_or(false);
    from_nginx || status == 404
}

/// Status codes the host-side probe accepts: a default backend (200) or none (404)
pub fn accept_host_status(code: &str) -> bool {
    matches!(code.trim(), "200" | "404")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Outcome of every diagnostic command, in the order they ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub checks: Vec<DiagnosticCheck>,
}

impl DiagnosticReport {
    #[cfg(test)]
    pub fn passed(&self, name: &str) -> Option<bool> {
        self.checks.iter().find(|c| c.name == name).map(|c| c.passed)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "network diagnostics:")?;
        for check in &self.checks {
            let mark = if check.passed { "ok" } else { "FAILED" };
            writeln!(f, "  [{}] {}", mark, check.name)?;
            for line in check.detail.lines() {
                writeln!(f, "      {}", line)?;
            }
        }
        Ok(())
    }
}

/// Commands run when the probes fail, named for the report
pub fn diagnostic_commands(endpoint: &IngressEndpoint) -> Vec<(&'static str, Invocation)> {
    let port = endpoint.port.to_string();
    vec![
        (
            "ping",
            Invocation::new("ping").args(["-c", "3", endpoint.host.as_str()]),
        ),
        (
            "port",
            Invocation::new("nc").args(["-z", "-w", "5", endpoint.host.as_str(), port.as_str()]),
        ),
        (
            "route",
            Invocation::new("route").args(["get", endpoint.host.as_str()]),
        ),
        (
            "service",
            Invocation::kubectl(["get", "service", SERVICE, "-n", NAMESPACE, "-o", "wide"]),
        ),
        (
            "controller logs",
            Invocation::kubectl(["logs", "-n", NAMESPACE, "-l", SELECTOR, "--tail=20"]),
        ),
    ]
}

/// Probes an ingress endpoint from this process and from the host shell
pub struct ConnectivityVerifier {
    http: reqwest::Client,
}

impl ConnectivityVerifier {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(PROBE_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// In-process HTTP GET against the endpoint
    pub async fn probe_http(&self, endpoint: &IngressEndpoint) -> std::result::Result<(), String> {
        let url = endpoint.url();
        info!("Making HTTP request to {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("failed to connect to ingress at {}: {}", url, e))?;

        let status = response.status();
        let server = response
            .headers()
            .get(reqwest::header::SERVER)
            .and_then(|v| v.to_str().ok());
        info!("HTTP response {} (server: {})", status, server.unwrap_or("-"));

        if classify_response(status.as_u16(), server) {
            Ok(())
        } else {
            Err(format!(
                "unexpected response from ingress, expected nginx or 404, got {}",
                status
            ))
        }
    }

    /// Host-side `curl`, which sees the network the way the operator's tools do
    pub async fn probe_host(
        &self,
        runner: &dyn CommandRunner,
        endpoint: &IngressEndpoint,
    ) -> std::result::Result<(), String> {
        let script = format!(
            "curl -s -o /dev/null -w '%{{http_code}}' --connect-timeout 10 {}",
            endpoint.url()
        );
        let output = runner
            .output(&Invocation::new("bash").args(["-c", script.as_str()]))
            .await
            .map_err(|e| format!("failed to test connectivity from host: {}", e))?;

        let code = output.trim();
        info!("Host curl response code: {}", code);
        if accept_host_status(code) {
            Ok(())
        } else {
            Err(format!("unexpected HTTP status from host: {}", code))
        }
    }

    /// Run every diagnostic command, whatever the outcome of the previous one
    pub async fn diagnose(
        &self,
        runner: &dyn CommandRunner,
        endpoint: &IngressEndpoint,
    ) -> DiagnosticReport {
        info!("Performing network analysis for {}...", endpoint.host);
        let mut report = DiagnosticReport::default();

        for (name, command) in diagnostic_commands(endpoint) {
            let command = command.timeout(DIAGNOSTIC_TIMEOUT);
            let check = match runner.output(&command).await {
                Ok(output) => DiagnosticCheck {
                    name: name.to_string(),
                    passed: true,
                    detail: output.trim().to_string(),
                },
                Err(e) => DiagnosticCheck {
                    name: name.to_string(),
                    passed: false,
                    detail: e.to_string(),
                },
            };
            if check.passed {
                info!("Diagnostic {} passed", name);
            } else {
                warn!("Diagnostic {} failed: {}", name, check.detail);
            }
            report.checks.push(check);
        }
        report
    }

    /// Both probes in order; a failure of either triggers one diagnostic sweep
    /// and is returned together with its report
    #[instrument(skip(self, runner))]
    pub async fn verify_endpoint(
        &self,
        runner: &dyn CommandRunner,
        endpoint: &IngressEndpoint,
    ) -> Result<()> {
        info!("Testing ingress connectivity at {}...", endpoint.url());

        let probed = match self.probe_http(endpoint).await {
            Ok(()) => self.probe_host(runner, endpoint).await,
            Err(reason) => Err(reason),
        };

        match probed {
            Ok(()) => {
                info!("All ingress connectivity tests passed");
                Ok(())
            }
            Err(reason) => {
                error!("Ingress connectivity test failed: {}", reason);
                let report = self.diagnose(runner, endpoint).await;
                Err(HomeserverError::ConnectivityFailed { reason, report })
            }
        }
    }
}

/// Wait for the controller, discover its address and probe it.
///
/// Pods that are not ready in time only warn; a missing address or a failed
/// probe is an error.
pub async fn verify_ingress_connectivity(
    client: &Client,
    runner: &dyn CommandRunner,
) -> Result<()> {
    info!("Verifying ingress connectivity...");

    if let Err(e) = wait_for_pods_ready(
        runner,
        &ReadinessCondition::matching(NAMESPACE, SELECTOR, POD_READY_TIMEOUT),
    )
    .await
    {
        warn!("Ingress controller pods not ready ({}), proceeding anyway", e);
    }

    let ip = wait_for_load_balancer_ip(client, NAMESPACE, SERVICE, ADDRESS_TIMEOUT).await?;
    ConnectivityVerifier::new()?
        .verify_endpoint(runner, &IngressEndpoint::new(ip))
        .await
}
