// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use serde_json::Value;

use crate::store::{StoreDescriptor, MANUAL_STORE_UID};
use crate::traits::ProcessDescriptor;

/// Field map produced by a transformation and stored as one entry.
pub type Payload = serde_json::Map<String, Value>;

/// Where an entry came from. Stamped by the store, never by transformation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub process_uid: String,
    pub input_structure_uid: Option<String>,
    pub input_data_key: Option<String>,
}

impl Provenance {
    pub fn new(
        process: &ProcessDescriptor,
        input_store: Option<&StoreDescriptor>,
        input_key: Option<&str>,
    ) -> Self {
        Self {
            process_uid: process.uid().to_string(),
            input_structure_uid: input_store.map(|s| s.uid().to_string()),
            input_data_key: input_key.map(str::to_string),
        }
    }

    /// Provenance of data typed in by a user rather than computed.
    pub fn manual() -> Self {
        Self {
            process_uid: MANUAL_STORE_UID.to_string(),
            input_structure_uid: None,
            input_data_key: None,
        }
    }

    /// The upstream entry this one was derived from, if any.
    pub fn parent(&self) -> Option<(&str, &str)> {
        match (&self.input_structure_uid, &self.input_data_key) {
            (Some(store), Some(key)) => Some((store.as_str(), key.as_str())),
            _ => None,
        }
    }
}

/// A single record of a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub entry_key: String,
    pub provenance: Provenance,
    pub data: Payload,
}

impl Entry {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Flat view with the provenance columns next to the payload fields.
    pub fn to_record(&self) -> Payload {
        let mut record = Payload::new();
        record.insert("entry_key".into(), self.entry_key.clone().into());
        record.insert("process_uid".into(), self.provenance.process_uid.clone().into());
        record.insert(
            "input_structure_uid".into(),
            self.provenance.input_structure_uid.clone().into(),
        );
        record.insert(
            "input_data_key".into(),
            self.provenance.input_data_key.clone().into(),
        );
        record.extend(self.data.clone());
        record
    }
}
