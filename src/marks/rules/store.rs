// SPDX-License-Identifier: MIT

//! Immutable rule table and lookup
//!
//! Keys address a directory (`bgp/`), a file (`bgp/test_bgp_fact.py`), a test
//! (`bgp/test_bgp_fact.py::test_bgp_facts`) or a parameterized case
//! (`...::test_bgp_facts[str-msn2700-01]`). A key matches a test id when it is
//! equal to it, or is a prefix ending on a path boundary.

use std::collections::BTreeMap;

use super::types::{Disposition, DispositionKind, RuleEntry};
use crate::engine::error::ParseError;
use crate::engine::facts::FactContext;

/// Loaded conditions table, read-only after construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    entries: BTreeMap<String, RuleEntry>,
}

/// Counts reported by `check`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSummary {
    pub entries: usize,
    pub skip_rules: usize,
    pub xfail_rules: usize,
    pub documentation_only: usize,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entry: RuleEntry) -> Result<(), ParseError> {
        if let Some(existing) = self.entries.get(&entry.test_id) {
            return Err(ParseError::DuplicateTestId {
                test_id: entry.test_id.clone(),
                first: existing.origin.clone(),
                second: entry.origin.clone(),
            });
        }
        self.entries.insert(entry.test_id.clone(), entry);
        Ok(())
    }

    /// Merge another table; the same test id in both is an error
    pub fn merge(&mut self, other: RuleTable) -> Result<(), ParseError> {
        for entry in other.entries.into_values() {
            self.insert(entry)?;
        }
        Ok(())
    }

    /// Entry registered under exactly this key
    pub fn get(&self, test_id: &str) -> Option<&RuleEntry> {
        self.entries.get(test_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.values()
    }

    /// Keys matching `test_id`, most specific first
    pub fn matches(&self, test_id: &str) -> Vec<&str> {
        candidate_keys(test_id)
            .into_iter()
            .filter_map(|key| self.entries.get_key_value(key).map(|(k, _)| k.as_str()))
            .collect()
    }

    /// Find the disposition for a test item
    ///
    /// Matching keys are tried from most to least specific; the first key
    /// whose rules hold decides. Within a key, skip wins over xfail.
    pub fn lookup(&self, test_id: &str, facts: &FactContext) -> Option<Disposition> {
        for key in self.matches(test_id) {
            let entry = &self.entries[key];
            if let Some(disposition) = entry.evaluate(facts) {
                log::debug!(
                    "Test '{}' marked {} by '{}': {}",
                    test_id,
                    disposition.kind,
                    key,
                    disposition.reason
                );
                return Some(disposition);
            }
            log::debug!("Conditions for '{}' do not hold for '{}'", key, test_id);
        }
        None
    }

    pub fn summary(&self) -> TableSummary {
        let mut summary = TableSummary {
            entries: self.entries.len(),
            ..Default::default()
        };
        for rule in self.entries.values().flat_map(|e| e.rules()) {
            match rule.disposition {
                DispositionKind::Skip => summary.skip_rules += 1,
                DispositionKind::Xfail => summary.xfail_rules += 1,
            }
            if rule.conditions.is_documentation_only() {
                summary.documentation_only += 1;
            }
        }
        summary
    }
}

/// Every prefix of `test_id` that could be a key, longest first
///
/// Nothing inside a parameter id is a boundary: `test_y[fe80::1]` yields
/// `test_y` but never `test_y[fe80`.
fn candidate_keys(test_id: &str) -> Vec<&str> {
    let mut keys = vec![test_id];
    let path_end = test_id.find('[').unwrap_or(test_id.len());
    if path_end < test_id.len() {
        keys.push(&test_id[..path_end]);
    }
    for (idx, c) in test_id[..path_end].char_indices().rev() {
        match c {
            '/' => {
                // Both `dir/` and `dir` address the directory
                keys.push(&test_id[..idx + 1]);
                keys.push(&test_id[..idx]);
            }
            ':' => keys.push(&test_id[..idx]),
            _ => {}
        }
    }
    keys.retain(|k| !k.is_empty());
    keys.dedup();
    keys
}
