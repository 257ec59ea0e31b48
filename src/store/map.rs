// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::errors::StoreError;
use crate::store::{DataStore, ManualStore, SqliteStore, StoreDescriptor};

/// Open stores keyed by uid.
#[derive(Clone, Default)]
pub struct StoreMap(HashMap<String, Arc<dyn DataStore>>);

impl StoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a table-backed store for every persistent descriptor and add the
    /// shared Manual store.
    pub async fn open<'a, I>(
        pool: &SqlitePool,
        descriptors: I,
        manual: Arc<ManualStore>,
    ) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = &'a StoreDescriptor>,
    {
        let mut map = Self::new();
        map.insert(manual);
        for descriptor in descriptors {
            if descriptor.is_manual() || map.contains(descriptor.uid()) {
                continue;
            }
            let store = SqliteStore::open(pool.clone(), descriptor.clone()).await?;
            map.insert(Arc::new(store));
        }
        Ok(map)
    }

    pub fn insert(&mut self, store: Arc<dyn DataStore>) {
        self.0.insert(store.uid().to_string(), store);
    }

    pub fn get(&self, uid: &str) -> Option<&Arc<dyn DataStore>> {
        self.0.get(uid)
    }

    /// Like `get`, but an unknown uid is an error.
    pub fn require(&self, uid: &str) -> Result<&Arc<dyn DataStore>, StoreError> {
        self.0.get(uid).ok_or_else(|| StoreError::UnknownStore {
            uid: uid.to_string(),
        })
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.0.contains_key(uid)
    }

    /// Uids in sorted order.
    pub fn uids(&self) -> Vec<&str> {
        let mut uids: Vec<&str> = self.0.keys().map(String::as_str).collect();
        uids.sort_unstable();
        uids
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StoreMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreMap").field(&self.uids()).finish()
    }
}
