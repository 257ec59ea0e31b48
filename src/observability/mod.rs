// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Log lines are produced by small message structs rather than inline format
//! strings. Each one implements `Display` for the human-readable text and
//! [`messages::StructuredLog`] to emit itself with structured fields at the
//! right level.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::store` - entry creation, key collisions, schema checks
//! * `messages::process` - per-step lifecycle of a transformation
//! * `messages::engine` - scheduling and pipeline runs
//! * `messages::registry` - registration and installation

use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub mod messages;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Already set in tests
    let _ = if config.json {
        set_global_default(builder.json().finish())
    } else {
        set_global_default(builder.compact().finish())
    };
}
