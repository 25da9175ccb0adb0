// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::{HomeserverError, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure a namespace exists in the cluster, create if it doesn't.
///
/// An existing namespace is left untouched. A create that loses a race with
/// another writer (409) also counts as success; any other failure is returned.
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(namespace).await {
        Ok(_) => {
            debug!("Namespace {} already exists", namespace);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating namespace {}", namespace);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(namespace.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            match namespaces.create(&PostParams::default(), &ns).await {
                Ok(_) => {
                    info!("Namespace {} created successfully", namespace);
                    Ok(())
                }
                Err(kube::Error::Api(err)) if err.code == 409 => {
                    info!("Namespace {} already exists, continuing", namespace);
                    Ok(())
                }
                Err(e) => Err(HomeserverError::NamespaceError(format!(
                    "Failed to create namespace {}: {}",
                    namespace, e
                ))),
            }
        }
        Err(e) => Err(HomeserverError::NamespaceError(format!(
            "Failed to check namespace {}: {}",
            namespace, e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{namespace_json, status_json, MockService};

    const NS_PATH: &str = "/api/v1/namespaces/argo-project";
    const CREATE_PATH: &str = "/api/v1/namespaces";

    #[tokio::test]
    async fn test_existing_namespace_is_not_recreated() {
        let mock = MockService::new().on_get(NS_PATH, 200, &namespace_json("argo-project"));

        ensure_namespace_exists(&mock.client(), "argo-project")
            .await
            .unwrap();

        assert_eq!(mock.count("POST"), 0);
    }

    #[tokio::test]
    async fn test_missing_namespace_is_created() {
        let mock = MockService::new().on_post(CREATE_PATH, 201, &namespace_json("argo-project"));

        ensure_namespace_exists(&mock.client(), "argo-project")
            .await
            .unwrap();

        assert_eq!(
            mock.requests(),
            vec![
                ("GET".to_string(), NS_PATH.to_string()),
                ("POST".to_string(), CREATE_PATH.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_create_conflict_counts_as_existing() {
        let mock = MockService::new().on_post(
            CREATE_PATH,
            409,
            &status_json(409, "AlreadyExists", "namespaces \"argo-project\" already exists"),
        );

        assert!(ensure_namespace_exists(&mock.client(), "argo-project")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let mock = MockService::new().on_post(
            CREATE_PATH,
            403,
            &status_json(403, "Forbidden", "namespaces is forbidden"),
        );

        let err = ensure_namespace_exists(&mock.client(), "argo-project")
            .await
            .unwrap_err();

        assert!(matches!(err, HomeserverError::NamespaceError(_)));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fatal_without_create() {
        let mock = MockService::new().on_get(
            NS_PATH,
            500,
            &status_json(500, "InternalError", "etcd unavailable"),
        );

        let err = ensure_namespace_exists(&mock.client(), "argo-project")
            .await
            .unwrap_err();

        assert!(matches!(err, HomeserverError::NamespaceError(_)));
        assert_eq!(mock.count("POST"), 0);
    }
}
