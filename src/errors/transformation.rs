// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failure inside a process body.
///
/// The step executor catches these at the process boundary and turns them into
/// a failed step report, so one broken step does not halt a multi-step run.
#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input entry lacks a field the body depends on
    #[error("Input entry is missing field '{0}'")]
    MissingInput(String),

    /// The input is present but unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}
