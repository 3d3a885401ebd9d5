// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Falzwerk — Core types, tool registry, page ranges, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod range;
pub mod registry;
pub mod types;

pub use config::AppConfig;
pub use error::FalzwerkError;
pub use range::{PageRangeParser, PageSelection};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use types::*;
