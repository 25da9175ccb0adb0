// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Opaque secrets created from operator-supplied values

use crate::constants::{APP_NAME, FIELD_MANAGER};
use crate::error::Result;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// An opaque secret holding a single key
pub fn single_key_secret(name: &str, namespace: &str, key: &str, value: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                "app.kubernetes.io/managed-by".to_string(),
                APP_NAME.to_string(),
            )])),
            ..Default::default()
        },
        string_data: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// Create or replace a secret with server-side apply.
///
/// The value never appears on a command line or in the logs.
#[instrument(skip(client, value))]
pub async fn apply_single_key_secret(
    client: &Client,
    namespace: &str,
    name: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = single_key_secret(name, namespace, key, value);

    let pp = PatchParams::apply(FIELD_MANAGER).force();
    secrets.patch(name, &pp, &Patch::Apply(&secret)).await?;

    info!("Secret {}/{} applied", namespace, name);
    Ok(())
}
