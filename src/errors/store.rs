// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors from the entry store layer.
///
/// These propagate to the immediate caller; nothing in the framework turns
/// them into messages on its own.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `create_entry` or `update` was called without every required field
    #[error("Missing required fields for store '{store}': {}", .fields.join(", "))]
    MissingField { store: String, fields: Vec<String> },

    /// A lookup found no record where one was expected
    #[error("No entry with {column} = '{value}' in store '{store}'")]
    NotFound {
        store: String,
        column: String,
        value: String,
    },

    /// A field that the store schema does not declare
    #[error("Store '{store}' has no column '{column}'")]
    UnknownColumn { store: String, column: String },

    /// Provenance fields are stamped by the store and cannot be supplied or changed
    #[error("Field '{column}' of store '{store}' is managed by the framework")]
    ReservedField { store: String, column: String },

    /// A value does not match the declared column type
    #[error("Column '{column}' of store '{store}' expects {expected}, got {found}")]
    TypeMismatch {
        store: String,
        column: String,
        expected: &'static str,
        found: String,
    },

    /// A write would repeat a value in a unique column
    #[error("Store '{store}' already holds an entry with this {column}")]
    DuplicateValue { store: String, column: String },

    /// The table on disk lacks columns the descriptor requires
    #[error("Table '{store}' is missing columns: {}", .missing.join(", "))]
    SchemaMismatch { store: String, missing: Vec<String> },

    /// A store uid that is not present in the store map
    #[error("Unknown store '{uid}'")]
    UnknownStore { uid: String },

    /// A stored JSON column could not be decoded
    #[error("Corrupt JSON in column '{column}' of store '{store}': {source}")]
    CorruptValue {
        store: String,
        column: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn not_found(store: &str, column: &str, value: &str) -> Self {
        StoreError::NotFound {
            store: store.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}
