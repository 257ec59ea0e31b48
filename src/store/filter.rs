// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::store::Entry;

/// Entry-key allow/deny lists. The blacklist always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub whitelist: Option<HashSet<String>>,
    pub blacklist: HashSet<String>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist
            .get_or_insert_with(HashSet::new)
            .extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn allows(&self, entry_key: &str) -> bool {
        if self.blacklist.contains(entry_key) {
            return false;
        }
        self.whitelist
            .as_ref()
            .map_or(true, |allowed| allowed.contains(entry_key))
    }

    pub fn apply(&self, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .into_iter()
            .filter(|e| self.allows(&e.entry_key))
            .collect()
    }
}
