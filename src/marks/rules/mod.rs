// SPDX-License-Identifier: MIT

//! Conditional mark rules
//!
//! This module provides:
//! - `ConditionRuleStore` - loads conditions tables from YAML
//! - `RuleTable` - the immutable table and its `lookup`
//! - rule and disposition types

pub mod loader;
pub mod store;
pub mod types;

pub use loader::ConditionRuleStore;
pub use store::{RuleTable, TableSummary};
pub use types::{Condition, Conditions, Disposition, DispositionKind, Rule, RuleEntry};
