// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process implementations for the tagsense pipeline.
//!
//! # Available Backends
//!
//! ## Local Backend
//! Built-in transformations compiled into the binary and registered from a
//! fixed catalog:
//! - **file_system_integration**: imports a file into managed storage under
//!   its BLAKE3 hash, skipping content that is already there
//! - **extract_file_metadata**: records size, media kind and timestamps of an
//!   imported file
//!
//! ## Stub Backend (Test-Only)
//! Small processes for exercising the engine (only available in test builds):
//! - **StubProcess**: upper-cases a `text` field and counts its calls
//! - **FailingProcess**: fails every step
//! - **InstallableProcess**: requires installation, optionally failing it
//! - **DigestProcess**: writes into a content-addressed store
//!
//! # Examples
//!
//! ```rust
//! use tagsense::backends::local::LocalProcessFactory;
//! use tagsense::config::StorageConfig;
//!
//! let processes = LocalProcessFactory::catalog(&StorageConfig::default())?;
//! assert_eq!(processes.len(), 2);
//! # Ok::<(), tagsense::errors::DescriptorError>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
