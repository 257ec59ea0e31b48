// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while loading configuration and building descriptors.
//!
//! Both kinds are start-up failures: a malformed descriptor or config file
//! stops the program before any store is touched.

use thiserror::Error;

/// A store or process descriptor failed validation at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    /// Names must be usable as SQL identifiers: `[a-z_][a-z0-9_]*`
    #[error("Invalid identifier '{name}': expected lowercase letters, digits and underscores")]
    InvalidIdentifier { name: String },

    /// The name is an SQL keyword or belongs to a table the framework owns
    #[error("Identifier '{name}' is reserved")]
    ReservedIdentifier { name: String },

    /// A payload column shadows one of the framework-managed columns
    #[error("Column '{column}' in store '{store}' is reserved for provenance bookkeeping")]
    ReservedColumn { store: String, column: String },

    /// The same column was declared twice
    #[error("Column '{column}' is declared more than once in store '{store}'")]
    DuplicateColumn { store: String, column: String },

    /// The content-hash column is not one of the declared columns
    #[error("Content column '{column}' is not declared in store '{store}'")]
    UnknownContentColumn { store: String, column: String },

    /// Processes may read from the Manual store but never write into it
    #[error("Process '{process}' cannot use the Manual store as its output")]
    ManualOutput { process: String },
}

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of its allowed range
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// `processes.enabled` names a process missing from the built-in catalog
    #[error("Unknown process '{uid}' in processes.enabled")]
    UnknownProcess { uid: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}
