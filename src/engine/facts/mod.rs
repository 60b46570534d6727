// SPDX-License-Identifier: MIT

//! Fact context for condition evaluation
//!
//! This module provides:
//! - `FactContext` - attribute name to value mapping supplied per test item
//! - `compare_versions` - ordering for release and build version strings

mod context;
mod version;

pub use context::FactContext;
pub use version::compare_versions;
