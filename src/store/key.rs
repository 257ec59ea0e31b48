// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use rand::RngCore;

use crate::errors::StoreError;
use crate::observability::messages::store::EntryKeyCollision;
use crate::observability::messages::StructuredLog;
use crate::store::DataStore;

/// Number of random bytes behind an entry key; the key is their hex encoding.
pub const ENTRY_KEY_BYTES: usize = 32;

pub fn random_entry_key() -> String {
    let mut bytes = [0u8; ENTRY_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Draw keys from `sample` until one is unused in `store`.
pub async fn unique_entry_key<S, F>(store: &S, mut sample: F) -> Result<String, StoreError>
where
    S: DataStore + ?Sized,
    F: FnMut() -> String + Send,
{
    loop {
        let key = sample();
        if store.read_by_entry_key(&key).await?.is_none() {
            return Ok(key);
        }
        EntryKeyCollision {
            store: store.descriptor().uid(),
            entry_key: &key,
        }
        .log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Provenance, ManualStore};
    use serde_json::json;

    #[test]
    fn test_random_entry_key_shape() {
        let key = random_entry_key();
        assert_eq!(key.len(), ENTRY_KEY_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, random_entry_key());
    }

    #[tokio::test]
    async fn test_unique_entry_key_resamples_on_collision() {
        let store = ManualStore::new();
        let taken = store
            .insert_with_provenance(json!({"v": 1}).as_object().cloned().unwrap(), Provenance::manual())
            .await
            .unwrap();

        let mut draws = vec!["fresh".to_string(), taken.clone(), taken.clone()];
        let key = unique_entry_key(&store, move || draws.pop().unwrap())
            .await
            .unwrap();

        assert_eq!(key, "fresh");
    }
}
