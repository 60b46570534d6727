//! Conditions loader - YAML file loading and rule compilation
//!
//! Every expression is parsed at load time, so a table that loads
//! successfully never fails during lookup.

use super::store::RuleTable;
use super::types::{
    Condition, Conditions, ConditionsFileSpec, ConditionsSpec, DispositionKind, LogicalOperator,
    MarkSpec, Rule, RuleEntry,
};
use crate::engine::condition::parse;
use crate::engine::error::{MarkError, ParseError};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

const INLINE_ORIGIN: &str = "<inline>";

/// Loads conditions tables from YAML sources
pub struct ConditionRuleStore;

impl ConditionRuleStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a conditions table from a YAML file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<RuleTable, MarkError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let table = Self::parse_source(&content, &path.display().to_string())?;
        log::info!(
            "Loaded {} mark entries from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Load and merge several conditions files; a test id may appear in only one
    pub fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RuleTable, MarkError> {
        let mut table = RuleTable::new();
        for path in paths {
            table.merge(self.load_file(path)?)?;
        }
        Ok(table)
    }

    /// Load a conditions table from in-memory YAML
    pub fn load(&self, content: &str) -> Result<RuleTable, ParseError> {
        Self::parse_yaml(content)
    }

    /// Parse a conditions table from a YAML string
    pub fn parse_yaml(content: &str) -> Result<RuleTable, ParseError> {
        Self::parse_source(content, INLINE_ORIGIN)
    }

    /// JSON schema of the conditions file format
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ConditionsFileSpec)
    }

    fn parse_source(content: &str, origin: &str) -> Result<RuleTable, ParseError> {
        if is_blank_document(content) {
            return Ok(RuleTable::new());
        }

        let root: Value = serde_yaml::from_str(content).map_err(|e| ParseError::Syntax {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        let mapping = match root {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            other => return Err(ParseError::NotAMapping(value_kind(&other).to_string())),
        };

        let mut table = RuleTable::new();
        for (key, body) in mapping {
            let test_id = match key {
                Value::String(s) => s,
                other => {
                    return Err(ParseError::InvalidEntry {
                        test_id: format!("{:?}", other),
                        disposition: String::new(),
                        message: "test id must be a string".to_string(),
                    })
                }
            };
            let entry = compile_entry(&test_id, body, origin)?;
            table.insert(entry)?;
        }
        Ok(table)
    }
}

impl Default for ConditionRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank_document(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn compile_entry(test_id: &str, body: Value, origin: &str) -> Result<RuleEntry, ParseError> {
    let marks = match body {
        Value::Mapping(m) => m,
        other => {
            return Err(ParseError::InvalidEntry {
                test_id: test_id.to_string(),
                disposition: String::new(),
                message: format!("expected a mapping of marks, found {}", value_kind(&other)),
            })
        }
    };

    let mut entry = RuleEntry {
        test_id: test_id.to_string(),
        skip: None,
        xfail: None,
        origin: origin.to_string(),
    };

    for (key, mark) in marks {
        let key = key.as_str().unwrap_or_default().to_string();
        let kind = DispositionKind::from_key(&key).ok_or_else(|| ParseError::UnknownDisposition {
            test_id: test_id.to_string(),
            key: key.clone(),
        })?;
        let rule = compile_rule(test_id, kind, mark)?;
        match kind {
            DispositionKind::Skip => entry.skip = Some(rule),
            DispositionKind::Xfail => entry.xfail = Some(rule),
        }
    }

    Ok(entry)
}

fn compile_rule(test_id: &str, kind: DispositionKind, mark: Value) -> Result<Rule, ParseError> {
    let invalid_conditions = |message: String| ParseError::InvalidConditions {
        test_id: test_id.to_string(),
        disposition: kind.to_string(),
        message,
    };

    // Shape-check `conditions` first so it gets a precise error
    if let Value::Mapping(m) = &mark {
        if let Some(conditions) = m.get("conditions") {
            match conditions {
                Value::Null | Value::String(_) => {}
                Value::Sequence(items) => {
                    if let Some((idx, bad)) =
                        items.iter().enumerate().find(|(_, v)| !v.is_string())
                    {
                        return Err(invalid_conditions(format!(
                            "item {} is {}, expected a string expression",
                            idx,
                            value_kind(bad)
                        )));
                    }
                }
                other => {
                    return Err(invalid_conditions(format!(
                        "expected a list of expressions or a note string, found {}",
                        value_kind(other)
                    )))
                }
            }
        }
    }

    let spec: MarkSpec = match mark {
        // `skip:` with no body is an unconditional skip
        Value::Null => MarkSpec {
            reason: String::new(),
            strict: false,
            conditions: None,
            conditions_logical_operator: LogicalOperator::And,
        },
        other => serde_yaml::from_value(other).map_err(|e| ParseError::InvalidEntry {
            test_id: test_id.to_string(),
            disposition: kind.to_string(),
            message: e.to_string(),
        })?,
    };

    let conditions = match spec.conditions {
        None => Conditions::Always,
        Some(ConditionsSpec::Note(note)) => {
            log::warn!(
                "Test '{}' {} conditions is a plain string ({:?}); treating it as always true",
                test_id,
                kind,
                note
            );
            Conditions::note(note)
        }
        Some(ConditionsSpec::List(sources)) => {
            let mut compiled = Vec::with_capacity(sources.len());
            for source in sources {
                let expr = parse(&source).map_err(|e| ParseError::InvalidExpression {
                    test_id: test_id.to_string(),
                    disposition: kind.to_string(),
                    source: e,
                })?;
                compiled.push(Condition { source, expr });
            }
            match spec.conditions_logical_operator {
                LogicalOperator::And => Conditions::All(compiled),
                LogicalOperator::Or => Conditions::Any(compiled),
            }
        }
    };

    if spec.strict && kind == DispositionKind::Skip {
        log::debug!("Test '{}' sets strict on a skip mark; ignored", test_id);
    }

    Ok(Rule {
        test_id: test_id.to_string(),
        disposition: kind,
        reason: spec.reason,
        strict: spec.strict,
        conditions,
    })
}
