pub mod pipeline;
pub mod provenance;
pub mod scheduler;
pub mod step;
pub mod worker;
#[cfg(test)]
mod integration_tests;

pub use pipeline::{PipelineRunner, RunSummary};
pub use provenance::{lineage, LineageLink};
pub use scheduler::schedule;
pub use step::{execute, SkipReason, StepOutcome, StepReport};
pub use worker::{follow_job, Job, PipelineWorker, WorkerEvent, WorkerHandle};
