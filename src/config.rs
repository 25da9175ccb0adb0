// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::constants::{colima, DEFAULT_EXTRA_PATH};

/// Installer configuration, compiled-in defaults overridable from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Colima profile hosting the cluster
    pub profile: String,
    pub cpus: u32,
    pub memory_gib: u32,
    /// Host interface the VM network is bridged onto
    pub network_interface: String,
    /// Directories prepended to PATH for every external command
    pub extra_path: Vec<PathBuf>,
    /// Home directory, `None` when it cannot be resolved
    pub home_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            profile: colima::PROFILE.to_string(),
            cpus: colima::CPUS,
            memory_gib: colima::MEMORY_GIB,
            network_interface: colima::NETWORK_INTERFACE.to_string(),
            extra_path: DEFAULT_EXTRA_PATH.iter().map(PathBuf::from).collect(),
            home_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let profile = non_empty(lookup("HOMESERVER_PROFILE")).unwrap_or(defaults.profile);
        let cpus = match non_empty(lookup("HOMESERVER_CPUS")) {
            Some(v) => v
                .parse()
                .with_context(|| {
                    format!("HOMESERVER_CPUS must be a positive integer, got '{}'", v)
                })?,
            None => defaults.cpus,
        };
        let memory_gib = match non_empty(lookup("HOMESERVER_MEMORY_GIB")) {
            Some(v) => v.parse().with_context(|| {
                format!("HOMESERVER_MEMORY_GIB must be a positive integer, got '{}'", v)
            })?,
            None => defaults.memory_gib,
        };
        if cpus == 0 || memory_gib == 0 {
            anyhow::bail!("HOMESERVER_CPUS and HOMESERVER_MEMORY_GIB must be greater than zero");
        }
        let network_interface =
            non_empty(lookup("HOMESERVER_NETWORK_INTERFACE")).unwrap_or(defaults.network_interface);
        let extra_path = match non_empty(lookup("HOMESERVER_EXTRA_PATH")) {
            Some(v) => env::split_paths(&v).collect(),
            None => defaults.extra_path,
        };
        let home_dir = non_empty(lookup("HOME")).map(PathBuf::from);

        Ok(Config {
            profile,
            cpus,
            memory_gib,
            network_interface,
            extra_path,
            home_dir,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = load(&[]).unwrap();

        assert_eq!(config.profile, "k3s-homeserver");
        assert_eq!(config.cpus, 4);
        assert_eq!(config.memory_gib, 8);
        assert_eq!(config.network_interface, "en1");
        assert_eq!(
            config.extra_path,
            vec![PathBuf::from("/usr/local/bin"), PathBuf::from("/opt/homebrew/bin")]
        );
        assert!(config.home_dir.is_none());
    }

    #[test]
    fn test_overrides_from_env() {
        let config = load(&[
            ("HOMESERVER_PROFILE", "lab"),
            ("HOMESERVER_CPUS", "2"),
            ("HOMESERVER_MEMORY_GIB", "6"),
            ("HOMESERVER_NETWORK_INTERFACE", "en0"),
            ("HOMESERVER_EXTRA_PATH", "/opt/tools/bin:/srv/bin"),
            ("HOME", "/Users/dev"),
        ])
        .unwrap();

        assert_eq!(config.profile, "lab");
        assert_eq!(config.cpus, 2);
        assert_eq!(config.memory_gib, 6);
        assert_eq!(config.network_interface, "en0");
        assert_eq!(
            config.extra_path,
            vec![PathBuf::from("/opt/tools/bin"), PathBuf::from("/srv/bin")]
        );
        assert_eq!(config.home_dir, Some(PathBuf::from("/Users/dev")));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("HOMESERVER_PROFILE", "  "), ("HOME", "")]).unwrap();

        assert_eq!(config.profile, "k3s-homeserver");
        assert!(config.home_dir.is_none());
    }

    #[test]
    fn test_invalid_cpus_rejected() {
        let err = load(&[("HOMESERVER_CPUS", "four")]).unwrap_err();
        assert!(err.to_string().contains("HOMESERVER_CPUS"));
    }

    #[test]
    fn test_zero_memory_rejected() {
        assert!(load(&[("HOMESERVER_MEMORY_GIB", "0")]).is_err());
    }
}
