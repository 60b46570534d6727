// SPDX-License-Identifier: MIT

//! Testbed inventory schema
//!
//! One entry per lab testbed:
//!
//! ```yaml
//! - conf-name: vms-kvm-t0
//!   group-name: vms6-1
//!   topo: t0
//!   ptf_image_name: docker-ptf
//!   ptf: ptf_vms6-1
//!   ptf_ip: 10.250.0.102/24
//!   ptf_ipv6: fec0::ffff:afa:2/64
//!   server: server_1
//!   vm_base: VM0100
//!   dut:
//!     - vlab-01
//!   comment: Tests virtual switch vm
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::engine::facts::FactContext;

/// A testbed definition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestbedEntry {
    #[serde(rename = "conf-name")]
    pub conf_name: String,
    #[serde(rename = "group-name", default)]
    pub group_name: Option<String>,
    pub topo: String,
    #[serde(default)]
    pub ptf_image_name: Option<String>,
    #[serde(default)]
    pub ptf: Option<String>,
    #[serde(default)]
    pub ptf_ip: Option<String>,
    #[serde(default)]
    pub ptf_ipv6: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub vm_base: Option<String>,
    #[serde(default)]
    pub dut: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Site-specific fields kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl TestbedEntry {
    /// Topology family of this testbed
    pub fn topo_type(&self) -> &'static str {
        topo_type(&self.topo)
    }

    /// Facts derived from the inventory, before any DUT discovery
    pub fn facts(&self) -> FactContext {
        let mut facts = FactContext::new()
            .with("conf_name", self.conf_name.as_str())
            .with("topo_name", self.topo.as_str())
            .with("topo_type", self.topo_type())
            .with(
                "duts",
                Value::Array(self.dut.iter().cloned().map(Value::String).collect()),
            )
            .with("is_multi_dut", self.dut.len() > 1);

        let optional = [
            ("group_name", &self.group_name),
            ("server", &self.server),
            ("ptf_image_name", &self.ptf_image_name),
            ("vm_base", &self.vm_base),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                facts.insert(key, v.as_str());
            }
        }
        if let Some(first) = self.dut.first() {
            facts.insert("dut", first.as_str());
        }
        facts
    }
}

/// Map a topology name to its family
///
/// `t0-64` and `dualtor-56` are `t0`, `t1-lag` is `t1`, `ptf32` is `ptf`.
pub fn topo_type(topo: &str) -> &'static str {
    const FAMILIES: [(&str, &str); 7] = [
        ("dualtor", "t0"),
        ("t0", "t0"),
        ("t1", "t1"),
        ("t2", "t2"),
        ("ptf", "ptf"),
        ("m0", "m0"),
        ("mx", "mx"),
    ];
    FAMILIES
        .iter()
        .find(|(prefix, _)| topo.starts_with(prefix))
        .map(|(_, family)| *family)
        .unwrap_or("unknown")
}
