// SPDX-License-Identifier: MIT

pub mod condition;
pub mod error;
pub mod facts;
