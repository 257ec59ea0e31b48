// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod processes;
pub mod factory;

pub use processes::*;
pub use factory::LocalProcessFactory;
