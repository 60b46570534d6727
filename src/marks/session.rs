// SPDX-License-Identifier: MIT

//! Per-session mark state handed to each test item
//!
//! The table is loaded once and shared behind an `Arc`; workers clone the
//! session cheaply and never mutate it.

use std::sync::Arc;

use super::config::Settings;
use super::rules::{ConditionRuleStore, Disposition, RuleTable};
use super::testbed::TestbedLoader;
use super::verdict::{TestOutcome, Verdict};
use crate::engine::error::MarkError;
use crate::engine::facts::FactContext;

#[derive(Debug, Clone)]
pub struct MarkSession {
    table: Arc<RuleTable>,
    base_facts: FactContext,
    ignore_marks: bool,
}

impl MarkSession {
    pub fn new(table: Arc<RuleTable>) -> Self {
        Self {
            table,
            base_facts: FactContext::new(),
            ignore_marks: false,
        }
    }

    /// Facts shared by every test item (typically testbed-derived)
    pub fn with_base_facts(mut self, facts: FactContext) -> Self {
        self.base_facts = facts;
        self
    }

    /// Disable every mark, as the harness' ignore switch does
    pub fn ignoring_marks(mut self, ignore: bool) -> Self {
        self.ignore_marks = ignore;
        self
    }

    /// Load conditions files and testbed facts named by `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self, MarkError> {
        settings.validate()?;

        let table = ConditionRuleStore::new().load_files(&settings.conditions_files)?;

        let mut base_facts = FactContext::new();
        if let (Some(file), Some(name)) = (&settings.testbed_file, &settings.testbed) {
            let inventory = TestbedLoader::new().load_file(file)?;
            base_facts = inventory.find(name)?.facts();
        }

        Ok(Self::new(Arc::new(table))
            .with_base_facts(base_facts)
            .ignoring_marks(settings.ignore_marks))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn base_facts(&self) -> &FactContext {
        &self.base_facts
    }

    pub fn ignores_marks(&self) -> bool {
        self.ignore_marks
    }

    /// Base facts overlaid with facts discovered for one test item
    pub fn facts_for(&self, item_facts: FactContext) -> FactContext {
        let mut facts = self.base_facts.clone();
        facts.extend(item_facts);
        facts
    }

    /// Disposition for a test item, or `None` to run it normally
    pub fn lookup(&self, test_id: &str, facts: &FactContext) -> Option<Disposition> {
        if self.ignore_marks {
            log::debug!("Marks ignored for '{}'", test_id);
            return None;
        }
        self.table.lookup(test_id, facts)
    }

    /// Reported verdict for a test item that produced `outcome`
    pub fn decide(&self, test_id: &str, facts: &FactContext, outcome: TestOutcome) -> Verdict {
        Verdict::decide(self.lookup(test_id, facts).as_ref(), outcome)
    }
}
