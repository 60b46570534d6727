// SPDX-License-Identifier: MIT

//! Condition evaluation for test marks
//!
//! This module provides parsing and evaluation of mark conditions.
//! Conditions are simple expressions like:
//! - `asic_type == 'broadcom'`
//! - `topo_name in ['dualtor', 'dualtor-56']`
//! - `asic_type in ['mellanox'] and release not in ['201911']`

mod ast;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expression, Literal};
pub use evaluator::{evaluate, evaluate_tristate};
pub use parser::parse;
