// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::TransformationError;

/// Errors from the process registry and its installation ledger.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Installation is append-only; a second attempt is a programming error
    #[error("Process '{uid}' is already installed")]
    AlreadyInstalled { uid: String },

    /// The process-specific install step failed; the process stays uninstalled
    #[error("Installing process '{uid}' failed: {source}")]
    InstallFailed {
        uid: String,
        #[source]
        source: TransformationError,
    },

    #[error("Unknown process '{uid}'")]
    UnknownProcess { uid: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
