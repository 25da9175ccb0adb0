// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use tracing::info;

use super::apply_manifest;
use crate::constants::metrics_server::MANIFEST_URL;
use crate::error::Result;
use crate::process::CommandRunner;

/// Install the latest metrics-server release manifest
pub async fn install(runner: &dyn CommandRunner) -> Result<()> {
    info!("Installing metrics-server...");
    apply_manifest(runner, MANIFEST_URL).await?;
    info!("metrics-server installed");
    Ok(())
}
