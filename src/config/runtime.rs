// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::backends::local::LocalProcessFactory;
use crate::config::Config;
use crate::engine::PipelineRunner;
use crate::errors::{ConfigError, PipelineError, StoreError};
use crate::registry::{InstallLedger, Registry};
use crate::store::database::connect;
use crate::store::{ManualStore, StoreMap};

/// Everything a caller needs to drive pipelines, built once at start-up.
pub struct Runtime {
    pub pool: SqlitePool,
    pub manual: Arc<ManualStore>,
    pub runner: Arc<PipelineRunner>,
}

impl Runtime {
    pub fn registry(&self) -> &Registry {
        self.runner.registry()
    }

    pub fn stores(&self) -> &StoreMap {
        self.runner.stores()
    }
}

/// Start-up sequence: connect, register the enabled built-in processes,
/// install the ones that need no explicit step, then open every store and
/// verify its table.
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    pub async fn from_config(cfg: &Config) -> Result<Runtime, PipelineError> {
        let pool = connect(&cfg.database).await.map_err(StoreError::from)?;
        Self::from_config_with_pool(cfg, pool).await
    }

    /// Same as [`RuntimeBuilder::from_config`] on an existing pool.
    pub async fn from_config_with_pool(cfg: &Config, pool: SqlitePool) -> Result<Runtime, PipelineError> {
        let processes = LocalProcessFactory::catalog(&cfg.storage)
            .map_err(ConfigError::from)?
            .into_iter()
            .filter(|p| cfg.processes.includes(p.uid()));

        let mut registry = Registry::new(InstallLedger::open(pool.clone()).await?);
        registry.register_processes(processes);
        registry.install_defaults().await?;

        let manual = Arc::new(ManualStore::new());
        let stores = StoreMap::open(&pool, registry.stores(), manual.clone()).await?;
        let runner = Arc::new(PipelineRunner::new(Arc::new(registry), stores));

        Ok(Runtime {
            pool,
            manual,
            runner,
        })
    }
}
