// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Step outcomes and the continuation policy shared by install and uninstall

use std::fmt;
use std::future::Future;

use tracing::{error, info, warn};

use crate::error::{HomeserverError, Result};

/// How a failing step affects the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Failure aborts the run
    Required,
    /// Failure is recorded as a warning and the run continues
    BestEffort,
    /// Like `Required`, reserved for checks that gate everything after them
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Warned(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: String,
    pub policy: Policy,
    pub outcome: StepOutcome,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StepOutcome::Completed => write!(f, "{}: ok", self.name),
            StepOutcome::Warned(reason) => write!(f, "{}: warning: {}", self.name, reason),
            StepOutcome::Failed(reason) => write!(f, "{}: failed: {}", self.name, reason),
        }
    }
}

/// Runs steps in order and records what happened to each
#[derive(Debug, Default)]
pub struct Workflow {
    records: Vec<StepRecord>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Steps that failed without aborting
    pub fn warnings(&self) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Warned(_)))
    }

    pub async fn required<T, Fut>(&mut self, name: &str, step: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.fatal(name, Policy::Required, step).await
    }

    pub async fn critical<T, Fut>(&mut self, name: &str, step: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.fatal(name, Policy::Critical, step).await
    }

    /// Run a step whose failure only warns; its value is `None` in that case
    pub async fn best_effort<T, Fut>(&mut self, name: &str, step: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match step.await {
            Ok(value) => {
                self.record(name, Policy::BestEffort, StepOutcome::Completed);
                Some(value)
            }
            Err(e) => {
                warn!("{} failed, continuing: {}", name, e);
                self.record(name, Policy::BestEffort, StepOutcome::Warned(e.to_string()));
                None
            }
        }
    }

    async fn fatal<T, Fut>(&mut self, name: &str, policy: Policy, step: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match step.await {
            Ok(value) => {
                self.record(name, policy, StepOutcome::Completed);
                Ok(value)
            }
            Err(e) => {
                error!("{} failed: {}", name, e);
                self.record(name, policy, StepOutcome::Failed(e.to_string()));
                Err(HomeserverError::StepFailed {
                    step: name.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    fn record(&mut self, name: &str, policy: Policy, outcome: StepOutcome) {
        self.records.push(StepRecord {
            name: name.to_string(),
            policy,
            outcome,
        });
    }

    /// Log the warned steps, if any
    pub fn log_summary(&self, what: &str) {
        let warnings: Vec<_> = self.warnings().collect();
        if warnings.is_empty() {
            info!("{} completed without warnings", what);
            return;
        }
        warn!("{} completed with {} warning(s):", what, warnings.len());
        for record in warnings {
            warn!("  {}", record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boom() -> HomeserverError {
        HomeserverError::InvalidInput("boom".to_string())
    }

    #[tokio::test]
    async fn test_required_failure_is_step_failed() {
        let mut wf = Workflow::new();

        let err = wf
            .required("MetalLB", async { Err::<(), _>(boom()) })
            .await
            .unwrap_err();

        match err {
            HomeserverError::StepFailed { step, source } => {
                assert_eq!(step, "MetalLB");
                assert!(matches!(*source, HomeserverError::InvalidInput(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            wf.records()[0].outcome,
            StepOutcome::Failed("invalid input: boom".to_string())
        );
    }

    #[tokio::test]
    async fn test_best_effort_failure_continues() {
        let mut wf = Workflow::new();

        let value = wf.best_effort("verify", async { Err::<u8, _>(boom()) }).await;
        let next = wf.required("next", async { Ok(5) }).await.unwrap();

        assert_eq!(value, None);
        assert_eq!(next, 5);
        assert_eq!(wf.warnings().count(), 1);
        assert_eq!(wf.records()[1].outcome, StepOutcome::Completed);
    }

    #[tokio::test]
    async fn test_critical_is_recorded_with_its_policy() {
        let mut wf = Workflow::new();

        assert!(wf
            .critical("connectivity", async { Err::<(), _>(boom()) })
            .await
            .is_err());
        assert_eq!(wf.records()[0].policy, Policy::Critical);
    }

    #[test]
    fn test_record_display() {
        let record = StepRecord {
            name: "Helm verify".to_string(),
            policy: Policy::BestEffort,
            outcome: StepOutcome::Warned("helm not found".to_string()),
        };
        assert_eq!(record.to_string(), "Helm verify: warning: helm not found");
    }
}
