// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A single background worker that runs pipeline jobs one at a time.
//!
//! Callers submit [`Job`]s through a [`WorkerHandle`] and follow progress on
//! a broadcast channel of [`WorkerEvent`]s. Jobs queue behind the one in
//! flight; there is no cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::engine::pipeline::PipelineRunner;
use crate::engine::step::StepReport;
use crate::errors::{PipelineError, RegistryError};
use crate::observability::messages::engine::{WorkerEventsLagged, WorkerJobReceived, WorkerShutdown};
use crate::observability::messages::StructuredLog;
use crate::traits::Process;

const JOB_QUEUE_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Run one process on one input entry
    Step { process_uid: String, input_key: String },
    /// Run a set of processes in dependency order; an empty set means every
    /// installed process
    Run {
        process_uids: Vec<String>,
        seed_keys: Vec<String>,
    },
}

impl Job {
    fn kind(&self) -> &'static str {
        match self {
            Job::Step { .. } => "step",
            Job::Run { .. } => "run",
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    JobStarted { job_id: u64 },
    StepFinished { job_id: u64, report: StepReport },
    /// `error` is set when the job could not run to the end
    JobFinished { job_id: u64, error: Option<String> },
    WorkerStopped,
}

pub struct PipelineWorker;

impl PipelineWorker {
    /// Start the worker task on the current runtime.
    pub fn spawn(runner: Arc<PipelineRunner>) -> WorkerHandle {
        let (jobs_tx, jobs_rx) = mpsc::channel(JOB_QUEUE_CAPACITY);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let task = tokio::spawn(worker_loop(runner, jobs_rx, events_tx.clone()));

        WorkerHandle {
            jobs: jobs_tx,
            events: events_tx,
            next_job_id: AtomicU64::new(1),
            task,
        }
    }
}

pub struct WorkerHandle {
    jobs: mpsc::Sender<(u64, Job)>,
    events: broadcast::Sender<WorkerEvent>,
    next_job_id: AtomicU64,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Queue a job and return its id. Subscribe before submitting to see
    /// every event of the job.
    pub async fn submit(&self, job: Job) -> Result<u64, PipelineError> {
        let job_id = self.next_job_id.fetch_add(1, Ordering::SeqCst);
        self.jobs
            .send((job_id, job))
            .await
            .map_err(|_| PipelineError::WorkerStopped)?;
        Ok(job_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }

    /// Stop accepting jobs, let queued ones finish and wait for the task.
    pub async fn shutdown(self) -> Result<(), PipelineError> {
        drop(self.jobs);
        self.task.await.map_err(|_| PipelineError::WorkerStopped)
    }
}

/// Follow `job_id` on `events` until it finishes, handing each of its step
/// reports to `on_step`. Returns the error message of a job that could not
/// run to the end.
///
/// A receiver that falls behind skips what the channel dropped and keeps
/// waiting; only a stopped worker ends the wait before the job does.
pub async fn follow_job(
    events: &mut broadcast::Receiver<WorkerEvent>,
    job_id: u64,
    mut on_step: impl FnMut(&StepReport),
) -> Result<Option<String>, PipelineError> {
    loop {
        match events.recv().await {
            Ok(WorkerEvent::StepFinished { job_id: id, report }) if id == job_id => on_step(&report),
            Ok(WorkerEvent::JobFinished { job_id: id, error }) if id == job_id => return Ok(error),
            Ok(WorkerEvent::WorkerStopped) | Err(RecvError::Closed) => {
                return Err(PipelineError::WorkerStopped)
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => WorkerEventsLagged { job_id, skipped }.log(),
        }
    }
}

async fn worker_loop(
    runner: Arc<PipelineRunner>,
    mut jobs: mpsc::Receiver<(u64, Job)>,
    events: broadcast::Sender<WorkerEvent>,
) {
    let mut processed = 0u64;
    while let Some((job_id, job)) = jobs.recv().await {
        WorkerJobReceived {
            job_id,
            kind: job.kind(),
        }
        .log();
        // A send only fails when nobody is listening
        let _ = events.send(WorkerEvent::JobStarted { job_id });

        let result = run_job(&runner, job_id, job, &events).await;
        let _ = events.send(WorkerEvent::JobFinished {
            job_id,
            error: result.err().map(|e| e.to_string()),
        });
        processed += 1;
    }

    WorkerShutdown {
        jobs_processed: processed,
    }
    .log();
    let _ = events.send(WorkerEvent::WorkerStopped);
}

async fn run_job(
    runner: &PipelineRunner,
    job_id: u64,
    job: Job,
    events: &broadcast::Sender<WorkerEvent>,
) -> Result<(), PipelineError> {
    match job {
        Job::Step {
            process_uid,
            input_key,
        } => {
            let process = lookup(runner, &process_uid)?;
            let report = runner.run_step(process.as_ref(), &input_key).await?;
            let _ = events.send(WorkerEvent::StepFinished { job_id, report });
        }
        Job::Run {
            process_uids,
            seed_keys,
        } => {
            let processes = if process_uids.is_empty() {
                runner.registry().installed_processes().await?
            } else {
                process_uids
                    .iter()
                    .map(|uid| lookup(runner, uid))
                    .collect::<Result<Vec<_>, _>>()?
            };
            runner
                .run_with_progress(&processes, &seed_keys, |report| {
                    let _ = events.send(WorkerEvent::StepFinished {
                        job_id,
                        report: report.clone(),
                    });
                })
                .await?;
        }
    }
    Ok(())
}

fn lookup(runner: &PipelineRunner, uid: &str) -> Result<Arc<dyn Process>, PipelineError> {
    runner
        .registry()
        .fetch_process(uid)
        .cloned()
        .ok_or_else(|| {
            RegistryError::UnknownProcess {
                uid: uid.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::step::StepOutcome;

    fn failed_report(input_key: &str) -> StepReport {
        StepReport {
            process_uid: "echo".to_string(),
            input_key: input_key.to_string(),
            outcome: StepOutcome::Failed {
                error: "boom".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_follow_job_survives_a_lagging_receiver() {
        let (tx, mut rx) = broadcast::channel(4);
        for i in 0..10 {
            tx.send(WorkerEvent::StepFinished {
                job_id: 1,
                report: failed_report(&format!("k{i}")),
            })
            .unwrap();
        }
        tx.send(WorkerEvent::JobFinished {
            job_id: 1,
            error: None,
        })
        .unwrap();

        let mut seen = Vec::new();
        let result = follow_job(&mut rx, 1, |report| seen.push(report.input_key.clone())).await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(seen, vec!["k7", "k8", "k9"]);
    }

    #[tokio::test]
    async fn test_follow_job_ignores_other_jobs_and_reports_errors() {
        let (tx, mut rx) = broadcast::channel(16);
        tx.send(WorkerEvent::StepFinished {
            job_id: 2,
            report: failed_report("other"),
        })
        .unwrap();
        tx.send(WorkerEvent::JobFinished {
            job_id: 2,
            error: None,
        })
        .unwrap();
        tx.send(WorkerEvent::StepFinished {
            job_id: 3,
            report: failed_report("mine"),
        })
        .unwrap();
        tx.send(WorkerEvent::JobFinished {
            job_id: 3,
            error: Some("unknown process".to_string()),
        })
        .unwrap();

        let mut seen = Vec::new();
        let result = follow_job(&mut rx, 3, |report| seen.push(report.input_key.clone())).await;

        assert_eq!(result.unwrap().as_deref(), Some("unknown process"));
        assert_eq!(seen, vec!["mine"]);
    }

    #[tokio::test]
    async fn test_follow_job_stops_with_the_worker() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(WorkerEvent::WorkerStopped).unwrap();
        let result = follow_job(&mut rx, 1, |_| {}).await;
        assert!(matches!(result, Err(PipelineError::WorkerStopped)));

        drop(tx);
        let result = follow_job(&mut rx, 1, |_| {}).await;
        assert!(matches!(result, Err(PipelineError::WorkerStopped)));
    }
}
