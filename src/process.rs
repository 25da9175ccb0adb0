// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External command execution with an augmented search path

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::{info, warn};

use crate::constants::FALLBACK_SYSTEM_PATH;
use crate::error::{HomeserverError, Result};

/// A single external command: program, arguments and an optional time budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Cancel the process if it runs longer than `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shorthand for `kubectl <args>`
    pub fn kubectl<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("kubectl").args(args)
    }

    /// Shorthand for `helm <args>`
    pub fn helm<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("helm").args(args)
    }

    /// True when the argument list equals `expected`
    pub fn args_are(&self, expected: &[&str]) -> bool {
        self.args.len() == expected.len() && self.args.iter().zip(expected).all(|(a, e)| a == e)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes external tools.
///
/// Abstracted so the installer steps can be exercised without the real binaries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio; fails on non-zero exit, missing binary or timeout
    async fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run and return captured stdout; stderr is kept for the error message
    async fn output(&self, invocation: &Invocation) -> Result<String>;

    /// Whether `program` resolves to an executable on the search path
    fn is_available(&self, program: &str) -> bool;
}

/// Runs commands on the host
#[derive(Debug, Clone)]
pub struct SystemRunner {
    search_path: OsString,
}

impl SystemRunner {
    /// Build a runner whose PATH is the caller's PATH augmented with `extra_path`
    pub fn new(extra_path: &[PathBuf]) -> Self {
        let current = env::var_os("PATH");
        Self {
            search_path: augment_path(current.as_deref(), extra_path),
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .env("PATH", &self.search_path)
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        echo(invocation);

        let mut child = self
            .command(invocation)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| spawn_error(invocation, e))?;

        let status = match invocation.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status?,
                    Err(_) => {
                        if let Err(e) = child.kill().await {
                            warn!("Failed to kill timed out command `{}`: {}", invocation, e);
                        }
                        return Err(timed_out(invocation, limit));
                    }
                }
            }
            None => child.wait().await?,
        };

        check_status(invocation, status, "")
    }

    async fn output(&self, invocation: &Invocation) -> Result<String> {
        echo(invocation);

        let child = self
            .command(invocation)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(invocation, e))?;

        // Dropping the future on timeout drops the child, which kills it
        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| timed_out(invocation, limit))??,
            None => child.wait_with_output().await?,
        };

        check_status(
            invocation,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim(),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_available(&self, program: &str) -> bool {
        if program.contains('/') {
            return is_executable(Path::new(program));
        }
        env::split_paths(&self.search_path).any(|dir| is_executable(&dir.join(program)))
    }
}

fn echo(invocation: &Invocation) {
    match invocation.timeout {
        Some(limit) => info!("Running: {} (timeout: {:?})", invocation, limit),
        None => info!("Running: {}", invocation),
    }
}

fn spawn_error(invocation: &Invocation, err: std::io::Error) -> HomeserverError {
    if err.kind() == std::io::ErrorKind::NotFound {
        HomeserverError::CommandNotFound {
            program: invocation.program.clone(),
        }
    } else {
        HomeserverError::Io(err)
    }
}

fn timed_out(invocation: &Invocation, timeout: Duration) -> HomeserverError {
    HomeserverError::CommandTimedOut {
        command: invocation.to_string(),
        timeout,
    }
}

fn check_status(invocation: &Invocation, status: ExitStatus, stderr: &str) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let message = if stderr.is_empty() {
        "see output above".to_string()
    } else {
        stderr.to_string()
    };
    Err(HomeserverError::command_failed(
        invocation.to_string(),
        status.to_string(),
        message,
    ))
}

/// Prepend `extra` to `current` unless every extra directory is already present.
///
/// With no PATH at all the result is `extra` followed by the system fallback.
pub fn augment_path(current: Option<&OsStr>, extra: &[PathBuf]) -> OsString {
    match current.filter(|p| !p.is_empty()) {
        Some(current) => {
            let existing: Vec<PathBuf> = env::split_paths(current).collect();
            if extra.iter().all(|dir| existing.contains(dir)) {
                return current.to_os_string();
            }
            env::join_paths(extra.iter().cloned().chain(existing))
                .unwrap_or_else(|_| current.to_os_string())
        }
        None => env::join_paths(
            extra
                .iter()
                .cloned()
                .chain(FALLBACK_SYSTEM_PATH.iter().map(PathBuf::from)),
        )
        .unwrap_or_default(),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn homebrew_dirs() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/opt/homebrew/bin"),
        ]
    }

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh").args(["-c", script])
    }

    #[test]
    fn test_invocation_display_joins_args() {
        let inv = Invocation::kubectl(["get", "nodes"]);
        assert_eq!(inv.to_string(), "kubectl get nodes");
        assert!(inv.args_are(&["get", "nodes"]));
        assert!(!inv.args_are(&["get"]));
    }

    #[test]
    fn test_augment_path_prepends_missing_dirs() {
        let path = augment_path(Some(OsStr::new("/usr/bin:/bin")), &homebrew_dirs());
        assert_eq!(path, "/usr/local/bin:/opt/homebrew/bin:/usr/bin:/bin");
    }

    #[test]
    fn test_augment_path_prepends_when_only_one_present() {
        let path = augment_path(Some(OsStr::new("/usr/local/bin:/usr/bin")), &homebrew_dirs());
        assert_eq!(
            path,
            "/usr/local/bin:/opt/homebrew/bin:/usr/local/bin:/usr/bin"
        );
    }

    #[test]
    fn test_augment_path_keeps_complete_path() {
        let current = "/opt/homebrew/bin:/usr/local/bin:/usr/bin";
        let path = augment_path(Some(OsStr::new(current)), &homebrew_dirs());
        assert_eq!(path, current);
    }

    #[test]
    fn test_augment_path_without_path_uses_fallback() {
        assert_eq!(
            augment_path(None, &homebrew_dirs()),
            "/usr/local/bin:/opt/homebrew/bin:/usr/bin:/bin"
        );
        assert_eq!(
            augment_path(Some(OsStr::new("")), &homebrew_dirs()),
            "/usr/local/bin:/opt/homebrew/bin:/usr/bin:/bin"
        );
    }

    #[tokio::test]
    async fn test_run_success() {
        let runner = SystemRunner::new(&[]);
        assert!(runner.run(&sh("exit 0")).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_non_zero_exit_is_command_failed() {
        let runner = SystemRunner::new(&[]);
        let err = runner.run(&sh("exit 3")).await.unwrap_err();

        assert!(matches!(err, HomeserverError::CommandFailed { .. }));
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn test_run_missing_binary_is_not_found() {
        let runner = SystemRunner::new(&[]);
        let err = runner
            .run(&Invocation::new("homeserver-no-such-binary"))
            .await
            .unwrap_err();

        assert!(matches!(err, HomeserverError::CommandNotFound { .. }));
    }

    #[tokio::test]
    async fn test_run_timeout_is_distinguishable() {
        let runner = SystemRunner::new(&[]);
        let err = runner
            .run(&sh("sleep 5").timeout(Duration::from_millis(100)))
            .await
            .unwrap_err();

        assert!(matches!(err, HomeserverError::CommandTimedOut { .. }));
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_run_within_timeout_succeeds() {
        let runner = SystemRunner::new(&[]);
        let inv = sh("exit 0").timeout(Duration::from_secs(10));
        assert!(runner.run(&inv).await.is_ok());
    }

    #[tokio::test]
    async fn test_output_captures_stdout() {
        let runner = SystemRunner::new(&[]);
        let out = runner.output(&sh("echo hello")).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_output_failure_carries_stderr() {
        let runner = SystemRunner::new(&[]);
        let err = runner
            .output(&sh("echo boom >&2; exit 2"))
            .await
            .unwrap_err();

        match err {
            HomeserverError::CommandFailed { message, .. } => assert_eq!(message, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_output_timeout_is_distinguishable() {
        let runner = SystemRunner::new(&[]);
        let err = runner
            .output(&sh("sleep 5").timeout(Duration::from_millis(100)))
            .await
            .unwrap_err();

        assert!(matches!(err, HomeserverError::CommandTimedOut { .. }));
    }

    #[test]
    fn test_is_available() {
        let runner = SystemRunner::new(&[]);
        assert!(runner.is_available("sh"));
        assert!(!runner.is_available("homeserver-no-such-binary"));
    }
}
