// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::store::{
    random_entry_key, unique_entry_key, DataStore, Entry, Payload, Provenance, StoreDescriptor,
};
use crate::traits::ProcessDescriptor;

/// In-memory store for user-supplied input. It has no schema, accepts any
/// non-empty payload and forgets everything when the process exits.
pub struct ManualStore {
    descriptor: StoreDescriptor,
    entries: RwLock<Vec<Entry>>,
}

impl Default for ManualStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualStore {
    pub fn new() -> Self {
        Self {
            descriptor: StoreDescriptor::manual(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Record user input; the entry's provenance names the Manual store itself.
    pub async fn submit(&self, data: Payload) -> Result<String, StoreError> {
        self.insert_with_provenance(data, Provenance::manual()).await
    }

    pub(crate) async fn insert_with_provenance(
        &self,
        data: Payload,
        provenance: Provenance,
    ) -> Result<String, StoreError> {
        if data.is_empty() {
            return Err(StoreError::MissingField {
                store: self.descriptor.uid().to_string(),
                fields: vec!["payload".to_string()],
            });
        }

        let entry_key = unique_entry_key(self, random_entry_key).await?;
        self.entries.write().await.push(Entry {
            entry_key: entry_key.clone(),
            provenance,
            data,
        });
        Ok(entry_key)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn find<P>(&self, predicate: P) -> Option<Entry>
    where
        P: Fn(&Entry) -> bool + Send,
    {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| predicate(e))
            .cloned()
    }
}

#[async_trait]
impl DataStore for ManualStore {
    fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    async fn create_entry(
        &self,
        data: Payload,
        process: &ProcessDescriptor,
        input_store: Option<&StoreDescriptor>,
        input_key: Option<&str>,
    ) -> Result<String, StoreError> {
        let provenance = Provenance::new(process, input_store, input_key);
        self.insert_with_provenance(data, provenance).await
    }

    async fn read_by_entry_key(&self, entry_key: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.find(|e| e.entry_key == entry_key).await)
    }

    async fn read_by_input_key(&self, input_key: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self
            .find(|e| e.provenance.input_data_key.as_deref() == Some(input_key))
            .await)
    }

    async fn read(&self, column: &str, value: &Value) -> Result<Option<Entry>, StoreError> {
        let matched = match column {
            "entry_key" => self.find(|e| value.as_str() == Some(e.entry_key.as_str())).await,
            "process_uid" => {
                self.find(|e| value.as_str() == Some(e.provenance.process_uid.as_str()))
                    .await
            }
            "input_structure_uid" => {
                self.find(|e| value.as_str() == e.provenance.input_structure_uid.as_deref())
                    .await
            }
            "input_data_key" => {
                self.find(|e| value.as_str() == e.provenance.input_data_key.as_deref())
                    .await
            }
            field => self.find(|e| e.data.get(field) == Some(value)).await,
        };
        Ok(matched)
    }

    async fn update(&self, entry_key: &str, updates: Payload) -> Result<Entry, StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.entry_key == entry_key)
            .ok_or_else(|| StoreError::not_found(self.descriptor.uid(), "entry_key", entry_key))?;
        entry.data.extend(updates);
        Ok(entry.clone())
    }

    async fn delete(&self, entry_key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.entry_key != entry_key);
        if entries.len() == before {
            return Err(StoreError::not_found(self.descriptor.uid(), "entry_key", entry_key));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.entries.read().await.clone())
    }
}
