// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Usage Pattern
//!
//! ```rust
//! use tagsense::observability::messages::store::EntryCreated;
//! use tagsense::observability::messages::StructuredLog;
//!
//! EntryCreated {
//!     store: "file_table",
//!     entry_key: "9f86d081",
//!     process_uid: "file_system_integration",
//! }
//! .log();
//! ```

use tracing::Span;

pub mod engine;
pub mod process;
pub mod registry;
pub mod store;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// A span carrying the same fields, for wrapping the work the message announces.
    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("event", span_name = name)
    }
}
