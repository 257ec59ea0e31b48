// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Entry stores: schema-validated record collections with provenance.
//!
//! Every record a process writes lands in exactly one store and carries a
//! random entry key plus the `(process_uid, input_structure_uid,
//! input_data_key)` triple naming what produced it. Two backends implement
//! [`DataStore`]:
//!
//! * [`SqliteStore`] - one SQLite table per store, persistent
//! * [`ManualStore`] - the in-memory `Manual` store holding user-supplied input
//!
//! Transformation code never touches provenance; it hands a payload to
//! [`DataStore::create_entry`] and the store stamps the rest.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use crate::traits::ProcessDescriptor;

pub mod database;
mod descriptor;
mod entry;
mod filter;
mod key;
mod manual;
mod map;
mod sqlite;
mod table;

pub(crate) use descriptor::validate_identifier;
pub use descriptor::{
    ColumnSpec, ColumnType, StoreDescriptor, MANUAL_STORE_UID, RESERVED_COLUMNS, RESERVED_TABLES,
};
pub use entry::{Entry, Payload, Provenance};
pub use filter::EntryFilter;
pub use key::{random_entry_key, unique_entry_key, ENTRY_KEY_BYTES};
pub use manual::ManualStore;
pub use map::StoreMap;
pub use sqlite::SqliteStore;
pub use table::TableSchema;


/// Common interface of every store backend.
///
/// Lookups return `Ok(None)` for a missing record; `update` and `delete`
/// treat a missing key as `NotFound`. Validation failures and backend errors
/// propagate unchanged.
#[async_trait]
pub trait DataStore: Send + Sync {
    fn descriptor(&self) -> &StoreDescriptor;

    fn uid(&self) -> &str {
        self.descriptor().uid()
    }

    /// Persistent stores survive a restart; the Manual store does not.
    fn is_persistent(&self) -> bool {
        !self.descriptor().is_manual()
    }

    /// Validate `data`, stamp provenance and store it under a fresh entry key.
    async fn create_entry(
        &self,
        data: Payload,
        process: &ProcessDescriptor,
        input_store: Option<&StoreDescriptor>,
        input_key: Option<&str>,
    ) -> Result<String, StoreError>;

    async fn read_by_entry_key(&self, entry_key: &str) -> Result<Option<Entry>, StoreError>;

    /// First entry whose `input_data_key` equals `input_key`.
    async fn read_by_input_key(&self, input_key: &str) -> Result<Option<Entry>, StoreError>;

    /// First entry whose `column` equals `value`.
    async fn read(&self, column: &str, value: &Value) -> Result<Option<Entry>, StoreError>;

    /// Overwrite the supplied fields and return the updated entry.
    async fn update(&self, entry_key: &str, updates: Payload) -> Result<Entry, StoreError>;

    async fn delete(&self, entry_key: &str) -> Result<(), StoreError>;

    /// Every entry in insertion order.
    async fn list_all(&self) -> Result<Vec<Entry>, StoreError>;

    async fn fetch_all_entry_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .map(|e| e.entry_key)
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list_all().await?.len())
    }

    async fn list_filtered(&self, filter: &EntryFilter) -> Result<Vec<Entry>, StoreError> {
        Ok(filter.apply(self.list_all().await?))
    }

    /// Like `read_by_entry_key`, but a missing entry is an error.
    async fn expect_entry(&self, entry_key: &str) -> Result<Entry, StoreError> {
        self.read_by_entry_key(entry_key)
            .await?
            .ok_or_else(|| StoreError::not_found(self.uid(), "entry_key", entry_key))
    }
}
