// SPDX-License-Identifier: MIT

pub mod config;
pub mod rules;
pub mod session;
pub mod testbed;
pub mod verdict;
