// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for a single transformation step.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::observability::messages::StructuredLog;

/// A step is about to run.
///
/// # Log Level
/// `debug!` - one per input entry
pub struct StepStarted<'a> {
    pub process_uid: &'a str,
    pub input_key: &'a str,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Running '{}' on {}", self.process_uid, self.input_key)
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::debug!(process_uid = self.process_uid, input_key = self.input_key, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step",
            span_name = name,
            process_uid = self.process_uid,
            input_key = self.input_key,
        )
    }
}

/// A step produced a new entry.
///
/// # Log Level
/// `info!` - important operational event
pub struct StepCompleted<'a> {
    pub process_uid: &'a str,
    pub input_key: &'a str,
    pub entry_key: &'a str,
    pub duration: Duration,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' completed for {}: entry {} ({:?})",
            self.process_uid, self.input_key, self.entry_key, self.duration
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            process_uid = self.process_uid,
            input_key = self.input_key,
            entry_key = self.entry_key,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A step did no work because its result already exists.
///
/// # Log Level
/// `info!` - reported to the caller, not a problem
pub struct StepSkipped<'a> {
    pub process_uid: &'a str,
    pub input_key: &'a str,
    pub reason: &'a str,
    pub existing_key: &'a str,
}

impl Display for StepSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' skipped {}: {} (entry {})",
            self.process_uid, self.input_key, self.reason, self.existing_key
        )
    }
}

impl StructuredLog for StepSkipped<'_> {
    fn log(&self) {
        tracing::info!(
            process_uid = self.process_uid,
            input_key = self.input_key,
            existing_key = self.existing_key,
            "{}", self
        );
    }
}

/// A transformation body returned an error.
///
/// # Log Level
/// `error!` - the step produced nothing
pub struct StepFailed<'a> {
    pub process_uid: &'a str,
    pub input_key: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' failed for {}: {}",
            self.process_uid, self.input_key, self.error
        )
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(
            process_uid = self.process_uid,
            input_key = self.input_key,
            error = %self.error,
            "{}", self
        );
    }
}

/// An imported file no longer matched the hash taken before it was copied.
///
/// # Log Level
/// `warn!` - the entry records the bytes that were actually copied
pub struct SourceChangedDuringImport<'a> {
    pub source: &'a std::path::Path,
    pub expected_hash: &'a str,
    pub copied_hash: &'a str,
}

impl Display for SourceChangedDuringImport<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} changed while importing; recording {} instead of {}",
            self.source.display(),
            self.copied_hash,
            self.expected_hash
        )
    }
}

impl StructuredLog for SourceChangedDuringImport<'_> {
    fn log(&self) {
        tracing::warn!(
            source = %self.source.display(),
            expected_hash = self.expected_hash,
            copied_hash = self.copied_hash,
            "{}", self
        );
    }
}
