// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Interactive input collected before provisioning starts

use std::fmt;
use std::io::{BufRead, Write};

use crate::constants::DEFAULT_ENV_LABEL;
use crate::error::{HomeserverError, Result};

/// Token for the GitLab secret store. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Reads answers from `input`, writing the questions to `output`
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Label for the node's `env` key; blank input or end of input means `dev`.
    ///
    /// The value must be a valid Kubernetes label value, so a typo is caught
    /// before the VM is provisioned.
    pub fn environment_label(&mut self) -> Result<String> {
        let answer = self.ask(&format!(
            "Enter environment label for the node [{}]: ",
            DEFAULT_ENV_LABEL
        ))?;
        if answer.is_empty() {
            return Ok(DEFAULT_ENV_LABEL.to_string());
        }
        validate_label_value(&answer)?;
        Ok(answer)
    }

    /// GitLab access token; blank input is an error
    pub fn access_token(&mut self) -> Result<AccessToken> {
        let answer = self.ask("Enter GitLab access token for External Secrets: ")?;
        if answer.is_empty() {
            return Err(HomeserverError::InvalidInput(
                "GitLab access token cannot be empty".to_string(),
            ));
        }
        Ok(AccessToken::new(answer))
    }
}

/// At most 63 characters of `[A-Za-z0-9._-]`, starting and ending alphanumeric
pub fn validate_label_value(value: &str) -> Result<()> {
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    let alnum_ends = value
        .chars()
        .next()
        .zip(value.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if value.len() > 63 || !valid_chars || !alnum_ends {
        return Err(HomeserverError::InvalidInput(format!(
            "'{}' is not a valid label value (max 63 characters, alphanumerics, '-', '_' or '.', \
             starting and ending with an alphanumeric)",
            value
        )));
    }
    Ok(())
}
