// SPDX-License-Identifier: MIT

//! Testbed inventory
//!
//! The inventory is owned by provisioning tooling; here it only seeds the
//! fact context with `topo_name`, `topo_type` and friends.

mod loader;
mod types;

pub use loader::{TestbedInventory, TestbedLoader};
pub use types::{topo_type, TestbedEntry};
