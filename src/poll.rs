// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fixed-interval polling bounded by a deadline, and pod readiness built on it

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{info, instrument, warn};

use crate::constants::poll::INTERVAL;
use crate::error::{HomeserverError, Result};
use crate::process::{CommandRunner, Invocation};

/// Outcome of one check:
/// - `Ok(Some(value))` - condition met
/// - `Ok(None)` - not yet, keep polling
/// - `Err(e)` - stop polling and return `e`
pub type PollResult<T> = Result<Option<T>>;

/// Poll `check` every `interval` until it yields a value or `max_wait` elapses.
///
/// Attempts start at fixed offsets from the first one, so a slow check does not
/// push later attempts back: a condition that never holds is checked
/// `ceil(max_wait / interval)` times. A check still running at the deadline is
/// abandoned. Success returns immediately, without sleeping again.
pub async fn poll_until<T, F, Fut>(
    description: &str,
    interval: Duration,
    max_wait: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollResult<T>>,
{
    let start = Instant::now();
    let deadline = start + max_wait;
    let mut attempts = 0u32;

    while Instant::now() < deadline {
        attempts += 1;
        match timeout_at(deadline, check()).await {
            Ok(result) => {
                if let Some(value) = result? {
                    return Ok(value);
                }
            }
            Err(_) => {
                warn!("Check for {} still running at the deadline", description);
                break;
            }
        }

        info!(
            "Still waiting for {}... ({}s elapsed)",
            description,
            start.elapsed().as_secs()
        );
        sleep_until((start + interval * attempts).min(deadline)).await;
    }

    Err(HomeserverError::Timeout {
        what: description.to_string(),
        waited: max_wait,
        attempts,
    })
}

/// Pods in a namespace, optionally narrowed by a label selector, that should become ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessCondition {
    pub namespace: String,
    pub selector: Option<String>,
    pub max_wait: Duration,
}

impl ReadinessCondition {
    /// Every pod in `namespace`
    pub fn all(namespace: &str, max_wait: Duration) -> Self {
        Self::matching(namespace, "", max_wait)
    }

    /// Pods matching `selector`; an empty selector means every pod
    pub fn matching(namespace: &str, selector: &str, max_wait: Duration) -> Self {
        Self {
            namespace: namespace.to_string(),
            selector: Some(selector.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            max_wait,
        }
    }

    /// Non-blocking `kubectl wait` that succeeds only if the pods are ready now
    pub fn query(&self) -> Invocation {
        let target = match &self.selector {
            Some(selector) => format!("--selector={}", selector),
            None => "--all".to_string(),
        };
        Invocation::kubectl([
            "wait",
            "--namespace",
            self.namespace.as_str(),
            "--for=condition=ready",
            "pod",
            target.as_str(),
            "--timeout=0s",
        ])
    }

    fn describe(&self) -> String {
        format!(
            "pods in namespace {} ({})",
            self.namespace,
            self.selector.as_deref().unwrap_or("all pods")
        )
    }
}

/// Wait for pods to become ready, querying every 10 seconds
#[instrument(skip(runner), fields(namespace = %condition.namespace))]
pub async fn wait_for_pods_ready(
    runner: &dyn CommandRunner,
    condition: &ReadinessCondition,
) -> Result<()> {
    let description = condition.describe();
    info!(
        "Waiting for {} to be ready (max {:?})...",
        description, condition.max_wait
    );

    let query = &condition.query();
    poll_until(&description, INTERVAL, condition.max_wait, move || async move {
        Ok(runner.run(query).await.ok())
    })
    .await?;

    info!("Pods in namespace {} are ready", condition.namespace);
    Ok(())
}
