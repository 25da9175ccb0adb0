// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Node lookup and labelling

use crate::constants::ENV_LABEL_KEY;
use crate::error::{HomeserverError, Result};
use k8s_openapi::api::core::v1::Node;
use kube::{
    api::{ListParams, Patch, PatchParams},
    Api, Client, ResourceExt,
};
use serde_json::json;
use tracing::{info, instrument};

/// Name of the first node reported by the API server
pub async fn first_node_name(client: &Client) -> Result<String> {
    let nodes: Api<Node> = Api::all(client.clone());
    let list = nodes.list(&ListParams::default().limit(1)).await?;

    list.items
        .first()
        .map(|node| node.name_any())
        .ok_or_else(|| HomeserverError::InvalidInput("cluster reports no nodes".to_string()))
}

/// Merge patch setting `env=<value>`, replacing any previous value
pub fn env_label_patch(value: &str) -> serde_json::Value {
    json!({
        "metadata": {
            "labels": {
                ENV_LABEL_KEY: value
            }
        }
    })
}

/// Label the first node with the environment label
#[instrument(skip(client))]
pub async fn label_first_node(client: &Client, env_label: &str) -> Result<String> {
    let node_name = first_node_name(client).await?;
    info!("Labeling node {} with {}={}", node_name, ENV_LABEL_KEY, env_label);

    let nodes: Api<Node> = Api::all(client.clone());
    nodes
        .patch(
            &node_name,
            &PatchParams::default(),
            &Patch::Merge(env_label_patch(env_label)),
        )
        .await?;

    info!("Node {} labeled", node_name);
    Ok(node_name)
}
