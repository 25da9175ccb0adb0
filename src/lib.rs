// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod addons;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod error;
pub mod install;
pub mod kubernetes;
pub mod poll;
pub mod process;
pub mod prompt;
pub mod uninstall;
pub mod workflow;

#[cfg(test)]
pub mod test_utils;
