// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! LoadBalancer address discovery

use crate::constants::poll::INTERVAL;
use crate::error::{HomeserverError, Result};
use crate::poll::poll_until;
use k8s_openapi::api::core::v1::Service;
use kube::{Api, Client};
use std::time::Duration;
use tracing::{info, instrument};

/// First ingress IP of a LoadBalancer service, if one was assigned.
///
/// Blank values and the `<nil>` placeholder count as unassigned.
pub fn load_balancer_ip(service: &Service) -> Option<String> {
    service
        .status
        .as_ref()?
        .load_balancer
        .as_ref()?
        .ingress
        .as_ref()?
        .first()?
        .ip
        .as_deref()
        .map(str::trim)
        .filter(|ip| !ip.is_empty() && *ip != "<nil>")
        .map(str::to_string)
}

/// Poll the service until the load balancer assigns it an address.
///
/// API errors abort the wait.
#[instrument(skip(client))]
pub async fn wait_for_load_balancer_ip(
    client: &Client,
    namespace: &str,
    name: &str,
    max_wait: Duration,
) -> Result<String> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let services = &services;
    let description = format!("external address of service {}/{}", namespace, name);

    let ip = poll_until(&description, INTERVAL, max_wait, move || async move {
        let service = services.get(name).await?;
        Ok::<_, HomeserverError>(load_balancer_ip(&service))
    })
    .await?;

    info!("Service {}/{} has address {}", namespace, name, ip);
    Ok(ip)
}
