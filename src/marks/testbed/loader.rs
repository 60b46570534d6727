//! Testbed inventory loader

use super::types::TestbedEntry;
use crate::engine::error::MarkError;
use std::fs;
use std::path::Path;

/// Parsed testbed inventory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestbedInventory {
    entries: Vec<TestbedEntry>,
}

impl TestbedInventory {
    /// Find a testbed by `conf-name`
    pub fn find(&self, conf_name: &str) -> Result<&TestbedEntry, MarkError> {
        self.entries
            .iter()
            .find(|e| e.conf_name == conf_name)
            .ok_or_else(|| MarkError::testbed_not_found(conf_name))
    }

    pub fn entries(&self) -> &[TestbedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads testbed inventories from YAML files
pub struct TestbedLoader;

impl TestbedLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a testbed inventory from a YAML file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<TestbedInventory, MarkError> {
        let content = fs::read_to_string(path.as_ref())?;
        let inventory = Self::parse_yaml(&content)?;
        log::info!(
            "Loaded {} testbeds from {}",
            inventory.len(),
            path.as_ref().display()
        );
        Ok(inventory)
    }

    /// Parse a testbed inventory from a YAML string
    pub fn parse_yaml(content: &str) -> Result<TestbedInventory, MarkError> {
        if content.trim().is_empty() {
            return Ok(TestbedInventory::default());
        }
        let entries: Option<Vec<TestbedEntry>> = serde_yaml::from_str(content)?;
        let entries = entries.unwrap_or_default();

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.conf_name.as_str()) {
                log::warn!(
                    "Testbed '{}' is defined more than once; the first definition is used",
                    entry.conf_name
                );
            }
        }

        Ok(TestbedInventory { entries })
    }
}

impl Default for TestbedLoader {
    fn default() -> Self {
        Self::new()
    }
}
