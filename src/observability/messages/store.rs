// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for store events: entry writes, key generation and the
//! start-up schema check.

use std::fmt::{Display, Formatter};

use crate::observability::messages::StructuredLog;

/// An entry was written.
///
/// # Log Level
/// `debug!` - one per record
pub struct EntryCreated<'a> {
    pub store: &'a str,
    pub entry_key: &'a str,
    pub process_uid: &'a str,
}

impl Display for EntryCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created entry {} in '{}' from '{}'",
            self.entry_key, self.store, self.process_uid
        )
    }
}

impl StructuredLog for EntryCreated<'_> {
    fn log(&self) {
        tracing::debug!(
            store = self.store,
            entry_key = self.entry_key,
            process_uid = self.process_uid,
            "{}", self
        );
    }
}

/// A freshly drawn entry key was already taken and will be re-sampled.
///
/// # Log Level
/// `warn!` - astronomically unlikely with 256-bit keys; worth noticing
pub struct EntryKeyCollision<'a> {
    pub store: &'a str,
    pub entry_key: &'a str,
}

impl Display for EntryKeyCollision<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Entry key {} already exists in '{}', drawing another",
            self.entry_key, self.store
        )
    }
}

impl StructuredLog for EntryKeyCollision<'_> {
    fn log(&self) {
        tracing::warn!(store = self.store, entry_key = self.entry_key, "{}", self);
    }
}

pub struct SchemaVerified<'a> {
    pub store: &'a str,
    pub column_count: usize,
}

impl Display for SchemaVerified<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Table '{}' verified with {} columns",
            self.store, self.column_count
        )
    }
}

impl StructuredLog for SchemaVerified<'_> {
    fn log(&self) {
        tracing::debug!(store = self.store, column_count = self.column_count, "{}", self);
    }
}

/// The table on disk predates the current descriptor.
///
/// # Log Level
/// `error!` - start-up cannot continue
pub struct SchemaMismatchDetected<'a> {
    pub store: &'a str,
    pub missing: &'a [String],
}

impl Display for SchemaMismatchDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Table '{}' is missing columns [{}]",
            self.store,
            self.missing.join(", ")
        )
    }
}

impl StructuredLog for SchemaMismatchDetected<'_> {
    fn log(&self) {
        tracing::error!(store = self.store, missing = ?self.missing, "{}", self);
    }
}
