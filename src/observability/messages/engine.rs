// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for scheduling, pipeline runs and the background worker.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::observability::messages::StructuredLog;

pub struct ScheduleComputed<'a> {
    pub order: &'a [&'a str],
}

impl Display for ScheduleComputed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Execution order: [{}]", self.order.join(", "))
    }
}

impl StructuredLog for ScheduleComputed<'_> {
    fn log(&self) {
        tracing::debug!(process_count = self.order.len(), "{}", self);
    }
}

/// The producer/consumer graph has a cycle and cannot be ordered.
///
/// # Log Level
/// `error!` - the run is aborted
pub struct CycleDetected<'a> {
    pub remaining: &'a [String],
}

impl Display for CycleDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dependency cycle among processes [{}]",
            self.remaining.join(", ")
        )
    }
}

impl StructuredLog for CycleDetected<'_> {
    fn log(&self) {
        tracing::error!(remaining = ?self.remaining, "{}", self);
    }
}

/// # Log Level
/// `info!` - important operational event
pub struct PipelineStarted {
    pub process_count: usize,
    pub seed_count: usize,
}

impl Display for PipelineStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline: {} processes, {} seed entries",
            self.process_count, self.seed_count
        )
    }
}

impl StructuredLog for PipelineStarted {
    fn log(&self) {
        tracing::info!(
            process_count = self.process_count,
            seed_count = self.seed_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            process_count = self.process_count,
            seed_count = self.seed_count,
        )
    }
}

pub struct PipelineCompleted {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl Display for PipelineCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline finished in {:?}: {} created, {} skipped, {} failed",
            self.duration, self.created, self.skipped, self.failed
        )
    }
}

impl StructuredLog for PipelineCompleted {
    fn log(&self) {
        tracing::info!(
            created = self.created,
            skipped = self.skipped,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A storage error interrupted one step; the run moves on.
pub struct StepAborted<'a> {
    pub process_uid: &'a str,
    pub input_key: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' on {} aborted: {}",
            self.process_uid, self.input_key, self.error
        )
    }
}

impl StructuredLog for StepAborted<'_> {
    fn log(&self) {
        tracing::error!(
            process_uid = self.process_uid,
            input_key = self.input_key,
            error = %self.error,
            "{}", self
        );
    }
}

pub struct WorkerJobReceived<'a> {
    pub job_id: u64,
    pub kind: &'a str,
}

impl Display for WorkerJobReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker picked up {} job #{}", self.kind, self.job_id)
    }
}

impl StructuredLog for WorkerJobReceived<'_> {
    fn log(&self) {
        tracing::debug!(job_id = self.job_id, kind = self.kind, "{}", self);
    }
}

pub struct WorkerShutdown {
    pub jobs_processed: u64,
}

impl Display for WorkerShutdown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker stopped after {} jobs", self.jobs_processed)
    }
}

impl StructuredLog for WorkerShutdown {
    fn log(&self) {
        tracing::info!(jobs_processed = self.jobs_processed, "{}", self);
    }
}

/// A progress listener fell behind and the channel dropped its oldest events.
///
/// # Log Level
/// `warn!` - some step reports were not seen, the job itself is unaffected
pub struct WorkerEventsLagged {
    pub job_id: u64,
    pub skipped: u64,
}

impl Display for WorkerEventsLagged {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Missed {} worker events while following job #{}",
            self.skipped, self.job_id
        )
    }
}

impl StructuredLog for WorkerEventsLagged {
    fn log(&self) {
        tracing::warn!(job_id = self.job_id, skipped = self.skipped, "{}", self);
    }
}
