// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::{ConfigError, RegistryError, ScheduleError, StoreError};

/// Errors that stop a pipeline run or worker job before any step runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker task has shut down and no longer accepts jobs
    #[error("Pipeline worker is not running")]
    WorkerStopped,
}
