// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in transformations
pub mod config;     // config + runtime assembly
pub mod engine;     // scheduling, step execution, worker
pub mod errors;     // error handling
pub mod observability;
pub mod registry;   // processes, stores, install ledger
pub mod store;      // entry stores
pub mod traits;     // process abstraction
