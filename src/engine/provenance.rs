// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::errors::StoreError;
use crate::store::StoreMap;

/// One hop of an entry's derivation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageLink {
    pub store_uid: String,
    pub entry_key: String,
    pub process_uid: String,
}

/// Follow provenance from an entry back to its root, starting with the entry
/// itself.
///
/// Manual entries do not survive a restart, so a chain whose Manual root is
/// gone simply ends there. Any other missing link is `NotFound`.
pub async fn lineage(
    stores: &StoreMap,
    store_uid: &str,
    entry_key: &str,
) -> Result<Vec<LineageLink>, StoreError> {
    let mut chain: Vec<LineageLink> = Vec::new();
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let mut current = (store_uid.to_string(), entry_key.to_string());

    while visited.insert(current.clone()) {
        let (store_uid, entry_key) = &current;
        let store = stores.require(store_uid)?;
        let entry = match store.read_by_entry_key(entry_key).await? {
            Some(entry) => entry,
            None if !chain.is_empty() && !store.is_persistent() => break,
            None => return Err(StoreError::not_found(store_uid, "entry_key", entry_key)),
        };

        chain.push(LineageLink {
            store_uid: store_uid.clone(),
            entry_key: entry.entry_key.clone(),
            process_uid: entry.provenance.process_uid.clone(),
        });

        match entry.provenance.parent() {
            Some((parent_store, parent_key)) => {
                current = (parent_store.to_string(), parent_key.to_string());
            }
            None => break,
        }
    }

    Ok(chain)
}
