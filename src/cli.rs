// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::cluster::KubeconfigConnector;
use crate::config::Config;
use crate::constants::APP_NAME;
use crate::install::Installer;
use crate::process::SystemRunner;
use crate::prompt::Prompter;
use crate::uninstall::Uninstaller;

/// Local single-node Kubernetes home server on Colima and K3s
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Provision the Colima VM with K3s and install the cluster add-ons
    Install,
    /// Remove the VM, Helm and all local cluster state
    Uninstall,
}

impl Commands {
    pub async fn run(self) -> Result<()> {
        let config = Config::from_env().context("Failed to load configuration")?;
        let runner = Arc::new(SystemRunner::new(&config.extra_path));

        match self {
            Commands::Install => {
                info!("Starting installation...");
                let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
                Installer::new(config, runner, Arc::new(KubeconfigConnector))
                    .run(&mut prompter)
                    .await
                    .context("Installation failed")?;
                info!("Installation completed successfully");
            }
            Commands::Uninstall => {
                info!("Starting uninstallation...");
                Uninstaller::new(config, runner)
                    .run()
                    .await
                    .context("Uninstallation failed")?;
                info!("Uninstallation completed successfully");
            }
        }
        Ok(())
    }
}

/// Help and version output are not failures; every other parse error is
pub fn exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_means_no_command() {
        let cli = Cli::try_parse_from([APP_NAME]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = Cli::try_parse_from([APP_NAME, "install"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Install));

        let cli = Cli::try_parse_from([APP_NAME, "uninstall"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Uninstall));
    }

    #[test]
    fn test_unknown_command_exits_with_one() {
        let err = Cli::try_parse_from([APP_NAME, "frobnicate"]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_help_and_version_exit_with_zero() {
        let help = Cli::try_parse_from([APP_NAME, "--help"]).unwrap_err();
        assert_eq!(exit_code(&help), 0);

        let version = Cli::try_parse_from([APP_NAME, "--version"]).unwrap_err();
        assert_eq!(exit_code(&version), 0);
    }
}
