// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod pipeline;
mod registry;
mod schedule;
mod store;
mod transformation;

pub use config::{ConfigError, DescriptorError};
pub use pipeline::PipelineError;
pub use registry::RegistryError;
pub use schedule::ScheduleError;
pub use store::StoreError;
pub use transformation::TransformationError;
