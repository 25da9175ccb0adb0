// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use thiserror::Error;

use crate::connectivity::DiagnosticReport;

#[derive(Error, Debug)]
pub enum HomeserverError {
    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("command `{command}` failed ({status}): {message}")]
    CommandFailed {
        command: String,
        status: String,
        message: String,
    },

    #[error("command `{command}` timed out after {timeout:?}")]
    CommandTimedOut { command: String, timeout: Duration },

    #[error("timeout: {what} not ready after {waited:?} ({attempts} attempts)")]
    Timeout {
        what: String,
        waited: Duration,
        attempts: u32,
    },

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("prerequisite not found: {tool} - {hint}")]
    MissingPrerequisite { tool: String, hint: String },

    #[error("ingress connectivity failed: {reason}\n{report}")]
    ConnectivityFailed {
        reason: String,
        report: DiagnosticReport,
    },

    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<HomeserverError>,
    },
}

impl HomeserverError {
    pub fn command_failed(
        command: impl Into<String>,
        status: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        HomeserverError::CommandFailed {
            command: command.into(),
            status: status.into(),
            message: message.into(),
        }
    }

    /// True for the timeout variants, both per-command and per-poll
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            HomeserverError::CommandTimedOut { .. } | HomeserverError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HomeserverError>;
