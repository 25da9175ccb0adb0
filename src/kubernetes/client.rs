// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client creation and API server reachability

use crate::constants::poll::INTERVAL;
use crate::error::Result;
use crate::poll::poll_until;
use k8s_openapi::api::core::v1::Node;
use kube::{api::ListParams, Api, Client};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Connect using the default kubeconfig (or in-cluster configuration)
pub async fn connect() -> Result<Client> {
    Ok(Client::try_default().await?)
}

/// True when the API server answers a minimal node listing
pub async fn api_reachable(client: &Client) -> bool {
    let nodes: Api<Node> = Api::all(client.clone());
    match nodes.list(&ListParams::default().limit(1)).await {
        Ok(_) => true,
        Err(e) => {
            debug!("Kubernetes API not reachable yet: {}", e);
            false
        }
    }
}

/// Wait for the API server of a freshly started cluster to answer.
///
/// The kubeconfig is re-read on every attempt since the VM supervisor may only
/// write it once the cluster is up. Returns the first client that got an answer.
#[instrument]
pub async fn wait_for_api_ready(max_wait: Duration) -> Result<Client> {
    info!("Waiting for the Kubernetes API to respond...");

    let client = poll_until("Kubernetes API", INTERVAL, max_wait, || async {
        let client = match connect().await {
            Ok(client) => client,
            Err(e) => {
                debug!("No usable kubeconfig yet: {}", e);
                return Ok(None);
            }
        };
        let reachable = api_reachable(&client).await;
        Ok(reachable.then_some(client))
    })
    .await?;

    info!("Kubernetes API is ready");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{node_list_json, status_json, MockService};

    #[tokio::test]
    async fn test_api_reachable_when_nodes_listed() {
        let mock = MockService::new().on_get("/api/v1/nodes", 200, &node_list_json(&["colima"]));

        assert!(api_reachable(&mock.client()).await);
        assert_eq!(
            mock.requests(),
            vec![("GET".to_string(), "/api/v1/nodes".to_string())]
        );
    }

    #[tokio::test]
    async fn test_api_unreachable_on_error() {
        let mock = MockService::new().on_get(
            "/api/v1/nodes",
            503,
            &status_json(503, "ServiceUnavailable", "apiserver starting"),
        );

        assert!(!api_reachable(&mock.client()).await);
    }
}
