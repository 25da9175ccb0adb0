// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, namespaces, nodes, secrets and services.

pub mod client;
pub mod namespaces;
pub mod nodes;
pub mod secrets;
pub mod services;

pub use client::{api_reachable, connect, wait_for_api_ready};
pub use namespaces::ensure_namespace_exists;
pub use nodes::label_first_node;
pub use secrets::apply_single_key_secret;
pub use services::wait_for_load_balancer_ip;
