// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors produced while ordering processes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Producer/consumer edges among these processes form a cycle
    #[error("Cyclic dependency detected among processes: {}", .processes.join(", "))]
    CyclicDependency { processes: Vec<String> },
}
