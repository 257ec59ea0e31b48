// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::engine::scheduler::schedule;
use crate::engine::step::{execute, StepReport};
use crate::errors::PipelineError;
use crate::observability::messages::engine::{PipelineCompleted, PipelineStarted, StepAborted};
use crate::observability::messages::StructuredLog;
use crate::registry::Registry;
use crate::store::StoreMap;
use crate::traits::Process;

/// Totals of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Process uids in the order they ran
    pub order: Vec<String>,
    pub reports: Vec<StepReport>,
}

impl RunSummary {
    pub fn created(&self) -> usize {
        self.reports.iter().filter(|r| r.is_created()).count()
    }

    pub fn skipped(&self) -> usize {
        self.reports.iter().filter(|r| r.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }

    pub fn reports_for<'a>(&'a self, process_uid: &'a str) -> impl Iterator<Item = &'a StepReport> {
        self.reports.iter().filter(move |r| r.process_uid == process_uid)
    }
}

/// Sequential executor over the registry's processes and the open stores.
///
/// One step runs at a time; a consumer sees every entry its producers wrote
/// earlier in the same run.
pub struct PipelineRunner {
    registry: Arc<Registry>,
    stores: StoreMap,
}

impl PipelineRunner {
    pub fn new(registry: Arc<Registry>, stores: StoreMap) -> Self {
        Self { registry, stores }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stores(&self) -> &StoreMap {
        &self.stores
    }

    /// Run one step, refusing processes that still await installation.
    pub async fn run_step(&self, process: &dyn Process, input_key: &str) -> Result<StepReport, PipelineError> {
        if process.descriptor().needs_installation() && !self.registry.is_installed(process).await? {
            return Ok(StepReport::failed(
                process.uid(),
                input_key,
                "process must be installed before it can run",
            ));
        }
        Ok(execute(process, &self.stores, input_key).await?)
    }

    /// Run `process` over `keys` in order. A storage error on one key is
    /// logged and reported as a failure for that key only.
    pub async fn run_batch<F>(&self, process: &dyn Process, keys: &[String], on_report: &mut F) -> Vec<StepReport>
    where
        F: FnMut(&StepReport) + Send,
    {
        let mut reports = Vec::with_capacity(keys.len());
        for key in keys {
            let report = match self.run_step(process, key).await {
                Ok(report) => report,
                Err(error) => {
                    StepAborted {
                        process_uid: process.uid(),
                        input_key: key,
                        error: &error,
                    }
                    .log();
                    StepReport::failed(process.uid(), key, &error)
                }
            };
            on_report(&report);
            reports.push(report);
        }
        reports
    }

    pub async fn run(&self, processes: &[Arc<dyn Process>], seed_keys: &[String]) -> Result<RunSummary, PipelineError> {
        self.run_with_progress(processes, seed_keys, |_| {}).await
    }

    /// Schedule `processes` and run each over its inputs, calling
    /// `on_report` after every step.
    ///
    /// Root processes (reading the Manual store) get `seed_keys`; every other
    /// process gets all entry keys of its input store as they stand when it
    /// starts.
    pub async fn run_with_progress<F>(
        &self,
        processes: &[Arc<dyn Process>],
        seed_keys: &[String],
        mut on_report: F,
    ) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(&StepReport) + Send,
    {
        let ordered = schedule(processes)?;
        let started = PipelineStarted {
            process_count: ordered.len(),
            seed_count: seed_keys.len(),
        };
        started.log();
        let start = Instant::now();

        let summary = self
            .run_ordered(&ordered, seed_keys, &mut on_report)
            .instrument(started.span("run"))
            .await?;

        PipelineCompleted {
            created: summary.created(),
            skipped: summary.skipped(),
            failed: summary.failed(),
            duration: start.elapsed(),
        }
        .log();
        Ok(summary)
    }

    async fn run_ordered<F>(
        &self,
        ordered: &[Arc<dyn Process>],
        seed_keys: &[String],
        on_report: &mut F,
    ) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(&StepReport) + Send,
    {
        let mut summary = RunSummary::default();
        for process in ordered {
            let descriptor = process.descriptor();
            let keys = if descriptor.is_root() {
                seed_keys.to_vec()
            } else {
                self.stores
                    .require(descriptor.input().uid())?
                    .fetch_all_entry_keys()
                    .await?
            };

            summary.order.push(process.uid().to_string());
            let reports = self.run_batch(process.as_ref(), &keys, on_report).await;
            summary.reports.extend(reports);
        }
        Ok(summary)
    }
}
