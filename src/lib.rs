// SPDX-License-Identifier: MIT

//! Conditional skip/xfail marks for test suites.
//!
//! `engine` holds the condition language and fact context; `marks` loads
//! conditions tables and testbed inventories and answers per-test lookups.

pub mod engine;
pub mod marks;
