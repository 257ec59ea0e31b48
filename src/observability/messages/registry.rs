// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for registration and installation.

use std::fmt::{Display, Formatter};

use crate::observability::messages::StructuredLog;

pub struct ProcessRegistered<'a> {
    pub process_uid: &'a str,
    pub input: &'a str,
    pub output: &'a str,
}

impl Display for ProcessRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered process '{}' ({} -> {})",
            self.process_uid, self.input, self.output
        )
    }
}

impl StructuredLog for ProcessRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            process_uid = self.process_uid,
            input = self.input,
            output = self.output,
            "{}", self
        );
    }
}

/// Two processes declare the same store uid with different schemas. The
/// first registration is kept.
///
/// # Log Level
/// `warn!` - the later process will likely fail on write
pub struct StoreDefinitionConflict<'a> {
    pub store: &'a str,
    pub process_uid: &'a str,
}

impl Display for StoreDefinitionConflict<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process '{}' redefines store '{}'; keeping the first definition",
            self.process_uid, self.store
        )
    }
}

impl StructuredLog for StoreDefinitionConflict<'_> {
    fn log(&self) {
        tracing::warn!(store = self.store, process_uid = self.process_uid, "{}", self);
    }
}

pub struct ProcessInstalled<'a> {
    pub process_uid: &'a str,
}

impl Display for ProcessInstalled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Installed process '{}'", self.process_uid)
    }
}

impl StructuredLog for ProcessInstalled<'_> {
    fn log(&self) {
        tracing::info!(process_uid = self.process_uid, "{}", self);
    }
}

pub struct InstallationFailed<'a> {
    pub process_uid: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InstallationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Installing process '{}' failed: {}",
            self.process_uid, self.error
        )
    }
}

impl StructuredLog for InstallationFailed<'_> {
    fn log(&self) {
        tracing::error!(process_uid = self.process_uid, error = %self.error, "{}", self);
    }
}
