// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Running one process on one input entry.
//!
//! The framework owns everything around the transformation body: resolving
//! stores, the once-per-input check for non-repeatable processes, content
//! dedup for content-addressed outputs and provenance stamping. A body error
//! ends the step as [`StepOutcome::Failed`]; storage errors propagate.

use std::fmt;
use std::time::Instant;

use serde_json::Value;
use tracing::Instrument;

use crate::errors::StoreError;
use crate::observability::messages::process::{StepCompleted, StepFailed, StepSkipped, StepStarted};
use crate::observability::messages::StructuredLog;
use crate::store::{Payload, StoreMap};
use crate::traits::{Process, StepInput};

/// Why a step did no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A non-repeatable process already has an output for this input
    AlreadyProcessed { existing_key: String },
    /// The output store already holds an entry with the same content hash
    DuplicateContent { existing_key: String },
}

impl SkipReason {
    pub fn existing_key(&self) -> &str {
        match self {
            SkipReason::AlreadyProcessed { existing_key }
            | SkipReason::DuplicateContent { existing_key } => existing_key,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyProcessed { .. } => write!(f, "already executed for this input"),
            SkipReason::DuplicateContent { .. } => write!(f, "already imported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Created { entry_key: String, payload: Payload },
    Skipped(SkipReason),
    Failed { error: String },
}

/// What happened when a process ran on one input.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub process_uid: String,
    pub input_key: String,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn failed(process_uid: &str, input_key: &str, error: impl fmt::Display) -> Self {
        Self {
            process_uid: process_uid.to_string(),
            input_key: input_key.to_string(),
            outcome: StepOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    /// Human-readable status line.
    pub fn message(&self) -> String {
        match &self.outcome {
            StepOutcome::Created { entry_key, .. } => format!(
                "{} completed for {}: created entry {}",
                self.process_uid, self.input_key, entry_key
            ),
            StepOutcome::Skipped(reason) => format!(
                "{} skipped {}: {}, entry {}",
                self.process_uid,
                self.input_key,
                reason,
                reason.existing_key()
            ),
            StepOutcome::Failed { error } => format!(
                "{} failed for {}: {}",
                self.process_uid, self.input_key, error
            ),
        }
    }

    /// The payload written, present only when an entry was created.
    pub fn payload(&self) -> Option<&Payload> {
        match &self.outcome {
            StepOutcome::Created { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn created_key(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Created { entry_key, .. } => Some(entry_key),
            _ => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.outcome, StepOutcome::Created { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, StepOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Failed { .. })
    }
}

/// Run `process` on the entry `input_key` of its input store.
///
/// # Errors
/// * `UnknownStore` if either store is missing from `stores`
/// * `NotFound` if the input entry does not exist
/// * any storage error from the lookups or the final write
pub async fn execute(
    process: &dyn Process,
    stores: &StoreMap,
    input_key: &str,
) -> Result<StepReport, StoreError> {
    let started = StepStarted {
        process_uid: process.uid(),
        input_key,
    };
    started.log();
    let span = started.span("execute");

    run_step(process, stores, input_key).instrument(span).await
}

async fn run_step(
    process: &dyn Process,
    stores: &StoreMap,
    input_key: &str,
) -> Result<StepReport, StoreError> {
    let descriptor = process.descriptor();
    let input = stores.require(descriptor.input().uid())?;
    let output = stores.require(descriptor.output().uid())?;
    let start = Instant::now();

    let report = |outcome| StepReport {
        process_uid: descriptor.uid().to_string(),
        input_key: input_key.to_string(),
        outcome,
    };
    let skipped = |reason: SkipReason| {
        StepSkipped {
            process_uid: descriptor.uid(),
            input_key,
            reason: &reason.to_string(),
            existing_key: reason.existing_key(),
        }
        .log();
        report(StepOutcome::Skipped(reason))
    };

    if !descriptor.is_repeatable() {
        if let Some(existing) = output.read_by_input_key(input_key).await? {
            return Ok(skipped(SkipReason::AlreadyProcessed {
                existing_key: existing.entry_key,
            }));
        }
    }

    let entry = input.expect_entry(input_key).await?;

    let content_key = match process.content_key(&entry).await {
        Ok(key) => key,
        Err(error) => {
            StepFailed {
                process_uid: descriptor.uid(),
                input_key,
                error: &error,
            }
            .log();
            return Ok(report(StepOutcome::Failed {
                error: error.to_string(),
            }));
        }
    };

    if let (Some(column), Some(key)) = (output.descriptor().content_column(), content_key.as_deref()) {
        if let Some(existing) = output.read(column, &Value::String(key.to_string())).await? {
            return Ok(skipped(SkipReason::DuplicateContent {
                existing_key: existing.entry_key,
            }));
        }
    }

    let step_input = StepInput {
        key: input_key,
        entry: &entry,
        content_key: content_key.as_deref(),
    };
    let payload = match process.compute(step_input).await {
        Ok(payload) => payload,
        Err(error) => {
            StepFailed {
                process_uid: descriptor.uid(),
                input_key,
                error: &error,
            }
            .log();
            return Ok(report(StepOutcome::Failed {
                error: error.to_string(),
            }));
        }
    };

    let entry_key = output
        .create_entry(
            payload.clone(),
            descriptor,
            Some(input.descriptor()),
            Some(input_key),
        )
        .await?;

    StepCompleted {
        process_uid: descriptor.uid(),
        input_key,
        entry_key: &entry_key,
        duration: start.elapsed(),
    }
    .log();

    Ok(report(StepOutcome::Created { entry_key, payload }))
}
