// SPDX-License-Identifier: MIT

//! YAML schema types and compiled rule types for mark conditions
//!
//! A conditions file maps test ids to marks:
//!
//! ```yaml
//! cacl/test_cacl_application.py::test_cacl_application:
//!   xfail:
//!     reason: "Image issue on Boradcom dualtor testbeds"
//!     strict: false
//!     conditions:
//!       - "asic_type in ['broadcom']"
//!       - "topo_name in ['dualtor', 'dualtor-56', 'dualtor-120']"
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::engine::condition::{evaluate, Expression};
use crate::engine::facts::FactContext;

/// Kind of mark applied to a test
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DispositionKind {
    /// Test is not executed at all
    Skip,
    /// Test runs; a failure is expected
    Xfail,
}

impl DispositionKind {
    /// Parse a mark key from a conditions file
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "skip" => Some(Self::Skip),
            "xfail" => Some(Self::Xfail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Xfail => "xfail",
        }
    }
}

impl std::fmt::Display for DispositionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the expressions of a `conditions` list are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Raw `conditions` value (list of expressions, or a bare note)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ConditionsSpec {
    /// Free-text or URL justification; applies unconditionally
    Note(String),
    /// Expressions combined by `conditions_logical_operator`
    List(Vec<String>),
}

/// A single `skip` or `xfail` block as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MarkSpec {
    #[serde(default)]
    pub reason: String,
    /// Only meaningful for xfail: an unexpected pass is a failure
    #[serde(default)]
    pub strict: bool,
    pub conditions: Option<ConditionsSpec>,
    #[serde(default)]
    pub conditions_logical_operator: LogicalOperator,
}

/// All marks for one test id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EntrySpec {
    pub skip: Option<MarkSpec>,
    pub xfail: Option<MarkSpec>,
}

/// Shape of a whole conditions file, used for schema output
pub type ConditionsFileSpec = BTreeMap<String, EntrySpec>;

/// A parsed condition expression together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub source: String,
    pub expr: Expression,
}

/// Compiled conditions of a rule
#[derive(Debug, Clone, PartialEq)]
pub enum Conditions {
    /// No `conditions` field
    Always,
    /// Scalar `conditions`: documentation only, always matches
    AlwaysTrue { note: String, link: Option<Url> },
    /// Every condition must hold
    All(Vec<Condition>),
    /// At least one condition must hold
    Any(Vec<Condition>),
}

impl Conditions {
    /// Build the documentation-only variant; the note is kept as a link when it is a URL
    pub fn note(note: impl Into<String>) -> Self {
        let note = note.into();
        let link = Url::parse(note.trim())
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"));
        Self::AlwaysTrue { note, link }
    }

    /// Check whether these conditions hold for the given facts
    pub fn holds(&self, facts: &FactContext) -> bool {
        match self {
            Conditions::Always | Conditions::AlwaysTrue { .. } => true,
            Conditions::All(conds) => conds.iter().all(|c| evaluate(&c.expr, facts)),
            Conditions::Any(conds) => conds.iter().any(|c| evaluate(&c.expr, facts)),
        }
    }

    pub fn is_documentation_only(&self) -> bool {
        matches!(self, Conditions::AlwaysTrue { .. })
    }

    /// Facts referenced by any condition
    pub fn attributes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        if let Conditions::All(conds) | Conditions::Any(conds) = self {
            for attr in conds.iter().flat_map(|c| c.expr.attributes()) {
                if !out.contains(&attr) {
                    out.push(attr);
                }
            }
        }
        out
    }
}

/// One disposition rule for a test id
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub test_id: String,
    pub disposition: DispositionKind,
    pub reason: String,
    pub strict: bool,
    pub conditions: Conditions,
}

impl Rule {
    /// Check whether this rule applies for the given facts
    pub fn applies(&self, facts: &FactContext) -> bool {
        self.conditions.holds(facts)
    }

    fn to_disposition(&self, matched_key: &str) -> Disposition {
        Disposition {
            kind: self.disposition,
            reason: self.reason.clone(),
            strict: self.strict,
            matched_key: matched_key.to_string(),
        }
    }
}

/// All rules registered under one test id
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub test_id: String,
    pub skip: Option<Rule>,
    pub xfail: Option<Rule>,
    /// Where the entry was loaded from
    pub origin: String,
}

impl RuleEntry {
    /// Evaluate this entry's rules; skip takes precedence over xfail
    pub fn evaluate(&self, facts: &FactContext) -> Option<Disposition> {
        [self.skip.as_ref(), self.xfail.as_ref()]
            .into_iter()
            .flatten()
            .find(|rule| rule.applies(facts))
            .map(|rule| rule.to_disposition(&self.test_id))
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.skip.iter().chain(self.xfail.iter())
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disposition {
    pub kind: DispositionKind,
    pub reason: String,
    pub strict: bool,
    /// Key in the conditions table that produced this disposition
    pub matched_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::condition::parse;

    fn cond(src: &str) -> Condition {
        Condition {
            source: src.to_string(),
            expr: parse(src).unwrap(),
        }
    }

    fn rule(kind: DispositionKind, conditions: Conditions) -> Rule {
        Rule {
            test_id: "t.py".to_string(),
            disposition: kind,
            reason: format!("{} reason", kind),
            strict: false,
            conditions,
        }
    }

    #[test]
    fn test_disposition_kind_from_key() {
        assert_eq!(DispositionKind::from_key("skip"), Some(DispositionKind::Skip));
        assert_eq!(DispositionKind::from_key("xfail"), Some(DispositionKind::Xfail));
        assert_eq!(DispositionKind::from_key("skipif"), None);
    }

    #[test]
    fn test_note_with_url_keeps_link() {
        match Conditions::note("https://github.com/sonic-net/sonic-mgmt/issues/1234") {
            Conditions::AlwaysTrue { link, .. } => {
                assert_eq!(link.unwrap().host_str(), Some("github.com"));
            }
            other => panic!("Expected AlwaysTrue, got {:?}", other),
        }
        match Conditions::note("flaky on slow testbeds") {
            Conditions::AlwaysTrue { link, .. } => assert!(link.is_none()),
            other => panic!("Expected AlwaysTrue, got {:?}", other),
        }
    }

    #[test]
    fn test_all_and_any() {
        let facts = FactContext::new().with("asic_type", "broadcom");
        let all = Conditions::All(vec![
            cond("asic_type == 'broadcom'"),
            cond("topo_type == 't0'"),
        ]);
        let any = Conditions::Any(vec![
            cond("asic_type == 'broadcom'"),
            cond("topo_type == 't0'"),
        ]);
        assert!(!all.holds(&facts));
        assert!(any.holds(&facts));
        assert!(Conditions::All(vec![]).holds(&facts));
        assert!(!Conditions::Any(vec![]).holds(&facts));
    }

    #[test]
    fn test_entry_prefers_skip() {
        let entry = RuleEntry {
            test_id: "t.py".to_string(),
            skip: Some(rule(DispositionKind::Skip, Conditions::Always)),
            xfail: Some(rule(DispositionKind::Xfail, Conditions::Always)),
            origin: "<test>".to_string(),
        };
        let d = entry.evaluate(&FactContext::new()).unwrap();
        assert_eq!(d.kind, DispositionKind::Skip);
        assert_eq!(d.reason, "skip reason");
        assert_eq!(d.matched_key, "t.py");
    }

    #[test]
    fn test_attributes() {
        let conds = Conditions::All(vec![
            cond("asic_type == 'x' and topo_name == 'y'"),
            cond("asic_type != 'z'"),
        ]);
        assert_eq!(conds.attributes(), vec!["asic_type", "topo_name"]);
        assert!(Conditions::Always.attributes().is_empty());
    }
}
