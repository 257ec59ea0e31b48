// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The registry: every known process and store, plus which processes are
//! installed.
//!
//! There is one registry per application, built at start-up and passed by
//! reference. Registration is a set union keyed by uid that keeps discovery
//! order. Installation state lives in the [`InstallLedger`] table, so it
//! survives restarts while the registry itself is rebuilt each time.

use std::sync::Arc;

use crate::errors::RegistryError;
use crate::observability::messages::registry::{
    InstallationFailed, ProcessInstalled, ProcessRegistered, StoreDefinitionConflict,
};
use crate::observability::messages::StructuredLog;
use crate::store::StoreDescriptor;
use crate::traits::Process;

mod ledger;

pub use ledger::InstallLedger;


/// Result of a uid lookup across processes and stores.
#[derive(Clone)]
pub enum RegistryItem<'a> {
    Process(&'a Arc<dyn Process>),
    Store(&'a StoreDescriptor),
}

impl RegistryItem<'_> {
    pub fn uid(&self) -> &str {
        match self {
            RegistryItem::Process(p) => p.uid(),
            RegistryItem::Store(s) => s.uid(),
        }
    }
}

pub struct Registry {
    processes: Vec<Arc<dyn Process>>,
    stores: Vec<StoreDescriptor>,
    ledger: InstallLedger,
}

impl Registry {
    pub fn new(ledger: InstallLedger) -> Self {
        Self {
            processes: Vec::new(),
            stores: Vec::new(),
            ledger,
        }
    }

    /// Add processes not yet known by uid, along with the stores they
    /// reference. Returns how many were new.
    pub fn register_processes<I>(&mut self, processes: I) -> usize
    where
        I: IntoIterator<Item = Arc<dyn Process>>,
    {
        let mut added = 0;
        for process in processes {
            if self.fetch_process(process.uid()).is_some() {
                continue;
            }
            let descriptor = process.descriptor();
            ProcessRegistered {
                process_uid: descriptor.uid(),
                input: descriptor.input().uid(),
                output: descriptor.output().uid(),
            }
            .log();

            for store in [descriptor.input(), descriptor.output()] {
                if let Some(existing) = self.fetch_store(store.uid()) {
                    if existing != store {
                        StoreDefinitionConflict {
                            store: store.uid(),
                            process_uid: descriptor.uid(),
                        }
                        .log();
                    }
                }
            }
            self.register_stores([descriptor.input().clone(), descriptor.output().clone()]);
            self.processes.push(process);
            added += 1;
        }
        added
    }

    /// Add stores not yet known by uid. Returns how many were new.
    pub fn register_stores<I>(&mut self, stores: I) -> usize
    where
        I: IntoIterator<Item = StoreDescriptor>,
    {
        let mut added = 0;
        for store in stores {
            if self.fetch_store(store.uid()).is_none() {
                self.stores.push(store);
                added += 1;
            }
        }
        added
    }

    pub fn processes(&self) -> &[Arc<dyn Process>] {
        &self.processes
    }

    /// Every registered store, the Manual store included.
    pub fn stores(&self) -> &[StoreDescriptor] {
        &self.stores
    }

    /// Stores backed by tables; what a consumer browsing data should see.
    pub fn real_stores(&self) -> impl Iterator<Item = &StoreDescriptor> {
        self.stores.iter().filter(|s| !s.is_manual())
    }

    pub fn fetch_process(&self, uid: &str) -> Option<&Arc<dyn Process>> {
        self.processes.iter().find(|p| p.uid() == uid)
    }

    pub fn fetch_store(&self, uid: &str) -> Option<&StoreDescriptor> {
        self.stores.iter().find(|s| s.uid() == uid)
    }

    /// Look a uid up among processes first, then stores.
    pub fn fetch_by_uid(&self, uid: &str) -> Option<RegistryItem<'_>> {
        self.fetch_process(uid)
            .map(RegistryItem::Process)
            .or_else(|| self.fetch_store(uid).map(RegistryItem::Store))
    }

    pub fn ledger(&self) -> &InstallLedger {
        &self.ledger
    }

    pub async fn is_installed(&self, process: &dyn Process) -> Result<bool, RegistryError> {
        self.ledger.contains(process.uid()).await
    }

    /// Record `process` as installed without running its install step.
    pub async fn mark_installed(&self, process: &dyn Process) -> Result<(), RegistryError> {
        self.ledger.insert(process.uid()).await
    }

    /// Run the process's install step, then record it.
    ///
    /// # Errors
    /// * `AlreadyInstalled` if it was installed before; the install step is not re-run
    /// * `InstallFailed` if the install step fails; the process stays uninstalled
    pub async fn install(&self, process: &dyn Process) -> Result<(), RegistryError> {
        if self.is_installed(process).await? {
            return Err(RegistryError::AlreadyInstalled {
                uid: process.uid().to_string(),
            });
        }

        if let Err(source) = process.install().await {
            InstallationFailed {
                process_uid: process.uid(),
                error: &source,
            }
            .log();
            return Err(RegistryError::InstallFailed {
                uid: process.uid().to_string(),
                source,
            });
        }

        self.mark_installed(process).await?;
        ProcessInstalled {
            process_uid: process.uid(),
        }
        .log();
        Ok(())
    }

    /// Look up `uid` and install it.
    pub async fn install_by_uid(&self, uid: &str) -> Result<(), RegistryError> {
        let process = self
            .fetch_process(uid)
            .ok_or_else(|| RegistryError::UnknownProcess {
                uid: uid.to_string(),
            })?;
        self.install(process.as_ref()).await
    }

    /// Install every process that needs no explicit installation and is not
    /// installed yet. Returns the uids installed by this call.
    pub async fn install_defaults(&self) -> Result<Vec<String>, RegistryError> {
        let mut installed = Vec::new();
        for process in &self.processes {
            if process.descriptor().needs_installation() || self.is_installed(process.as_ref()).await? {
                continue;
            }
            self.install(process.as_ref()).await?;
            installed.push(process.uid().to_string());
        }
        Ok(installed)
    }

    /// Installed processes in registration order.
    pub async fn installed_processes(&self) -> Result<Vec<Arc<dyn Process>>, RegistryError> {
        let installed = self.ledger.installed_uids().await?;
        Ok(self
            .processes
            .iter()
            .filter(|p| installed.iter().any(|uid| uid == p.uid()))
            .cloned()
            .collect())
    }

    /// Registered processes awaiting installation.
    pub async fn uninstalled(&self) -> Result<Vec<Arc<dyn Process>>, RegistryError> {
        let installed = self.ledger.installed_uids().await?;
        Ok(self
            .processes
            .iter()
            .filter(|p| !installed.iter().any(|uid| uid == p.uid()))
            .cloned()
            .collect())
    }

    /// Table-backed stores touched by installed processes, rebuilt from the
    /// ledger on every call.
    pub async fn active_stores(&self) -> Result<Vec<StoreDescriptor>, RegistryError> {
        let mut active: Vec<StoreDescriptor> = Vec::new();
        for process in self.installed_processes().await? {
            let descriptor = process.descriptor();
            for store in [descriptor.input(), descriptor.output()] {
                if !store.is_manual() && !active.iter().any(|s| s.uid() == store.uid()) {
                    active.push(store.clone());
                }
            }
        }
        Ok(active)
    }
}
