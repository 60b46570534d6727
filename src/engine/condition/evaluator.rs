//! Condition expression evaluator
//!
//! Comparisons against facts the context does not have are *unknown*, and
//! unknown propagates through `and`/`or`/`not`. An unknown result is false,
//! so `release != '202012'` does not hold when `release` was never discovered.

use super::ast::{CompareOp, Expression, Literal};
use crate::engine::facts::{compare_versions, FactContext};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluate a condition expression against a fact context
pub fn evaluate(expr: &Expression, facts: &FactContext) -> bool {
    evaluate_tristate(expr, facts).unwrap_or(false)
}

/// Evaluate with three-valued logic; `None` means undecidable
pub fn evaluate_tristate(expr: &Expression, facts: &FactContext) -> Option<bool> {
    match expr {
        Expression::True => Some(true),
        Expression::False => Some(false),
        Expression::Compare { left, op, right } => evaluate_compare(left, *op, right, facts),
        Expression::And(left, right) => {
            match (evaluate_tristate(left, facts), evaluate_tristate(right, facts)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            }
        }
        Expression::Or(left, right) => {
            match (evaluate_tristate(left, facts), evaluate_tristate(right, facts)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            }
        }
        Expression::Not(inner) => evaluate_tristate(inner, facts).map(|b| !b),
    }
}

fn evaluate_compare(
    left: &str,
    op: CompareOp,
    right: &Literal,
    facts: &FactContext,
) -> Option<bool> {
    let left_value = facts.get_path(left);

    if let Literal::Null = right {
        let is_null = matches!(left_value, None | Some(Value::Null));
        return match op {
            CompareOp::Eq => Some(is_null),
            CompareOp::NotEq => Some(!is_null),
            _ => None,
        };
    }

    let value = match left_value {
        None | Some(Value::Null) => return None,
        Some(v) => v,
    };

    match op {
        CompareOp::Eq => Some(values_equal(value, right)),
        CompareOp::NotEq => Some(!values_equal(value, right)),
        CompareOp::Gt => compare_ordered(value, right).map(|o| o == Ordering::Greater),
        CompareOp::Gte => compare_ordered(value, right).map(|o| o != Ordering::Less),
        CompareOp::Lt => compare_ordered(value, right).map(|o| o == Ordering::Less),
        CompareOp::Lte => compare_ordered(value, right).map(|o| o != Ordering::Greater),
        CompareOp::In => check_in(value, right),
        CompareOp::NotIn => check_in(value, right).map(|b| !b),
        CompareOp::Contains => check_contains(value, right),
        CompareOp::NotContains => check_contains(value, right).map(|b| !b),
    }
}

/// Textual form of a scalar fact, used when a fact and a literal differ in type
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn literal_text(literal: &Literal) -> Option<String> {
    match literal {
        Literal::String(s) => Some(s.clone()),
        Literal::Number(n) => Some(n.to_string()),
        Literal::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn values_equal(left: &Value, right: &Literal) -> bool {
    match (left, right) {
        (Value::Null, Literal::Null) => true,
        (Value::String(s), Literal::String(rs)) => s == rs,
        (Value::Number(n), Literal::Number(rn)) => n
            .as_f64()
            .map(|f| (f - rn).abs() < f64::EPSILON)
            .unwrap_or(false),
        (Value::Bool(b), Literal::Boolean(rb)) => b == rb,
        (Value::Number(n), Literal::String(rs)) => n.to_string() == *rs,
        (Value::String(s), Literal::Number(rn)) => s
            .trim()
            .parse::<f64>()
            .map(|f| (f - rn).abs() < f64::EPSILON)
            .unwrap_or(false),
        (Value::Bool(b), Literal::String(rs)) => rs.eq_ignore_ascii_case(&b.to_string()),
        (Value::String(s), Literal::Boolean(rb)) => s.eq_ignore_ascii_case(&rb.to_string()),
        (Value::Array(items), Literal::List(expected)) => {
            items.len() == expected.len()
                && items
                    .iter()
                    .zip(expected.iter())
                    .all(|(v, l)| values_equal(v, l))
        }
        _ => false,
    }
}

fn compare_ordered(left: &Value, right: &Literal) -> Option<Ordering> {
    if let (Value::Number(n), Literal::Number(rn)) = (left, right) {
        return n.as_f64()?.partial_cmp(rn);
    }
    let left = scalar_text(left)?;
    let right = literal_text(right)?;
    Some(compare_versions(&left, &right))
}

/// `fact in [..]` is list membership; `fact in 'text'` is substring
fn check_in(value: &Value, right: &Literal) -> Option<bool> {
    match right {
        Literal::List(items) => Some(items.iter().any(|item| values_equal(value, item))),
        Literal::String(haystack) => scalar_text(value).map(|s| haystack.contains(&s)),
        other => Some(values_equal(value, other)),
    }
}

fn check_contains(value: &Value, needle: &Literal) -> Option<bool> {
    match value {
        Value::String(s) => literal_text(needle).map(|n| s.contains(&n)),
        Value::Array(items) => Some(items.iter().any(|v| values_equal(v, needle))),
        Value::Object(map) => literal_text(needle).map(|n| map.contains_key(&n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::condition::parser::parse;
    use serde_json::json;

    fn facts_with(pairs: Vec<(&str, Value)>) -> FactContext {
        pairs.into_iter().collect()
    }

    fn eval(expr: &str, facts: &FactContext) -> bool {
        evaluate(&parse(expr).unwrap(), facts)
    }

    #[test]
    fn test_string_equality() {
        let facts = facts_with(vec![("asic_type", json!("broadcom"))]);
        assert!(eval("asic_type == 'broadcom'", &facts));
        assert!(!eval("asic_type == 'mellanox'", &facts));
        assert!(eval("asic_type != 'mellanox'", &facts));
    }

    #[test]
    fn test_membership() {
        let facts = facts_with(vec![("topo_name", json!("dualtor-56"))]);
        assert!(eval(
            "topo_name in ['dualtor', 'dualtor-56', 'dualtor-120']",
            &facts
        ));
        assert!(!eval("topo_name in ['t0', 't1']", &facts));
        assert!(eval("topo_name not in ['t0', 't1']", &facts));
        assert!(!eval("topo_name not in ['dualtor-56']", &facts));
    }

    #[test]
    fn test_substring_membership() {
        let facts = facts_with(vec![("topo_name", json!("t0-backend"))]);
        assert!(eval("'backend' in topo_name", &facts));
        assert!(eval("'t2' not in topo_name", &facts));
        assert!(eval("topo_name in 't0-backend-lag'", &facts));
    }

    #[test]
    fn test_missing_fact_fails_closed() {
        let facts = FactContext::new();
        assert!(!eval("asic_type == 'broadcom'", &facts));
        assert!(!eval("asic_type != 'broadcom'", &facts));
        assert!(!eval("asic_type in ['broadcom']", &facts));
        assert!(!eval("asic_type not in ['broadcom']", &facts));
        assert!(!eval("not asic_type == 'broadcom'", &facts));
        assert!(!eval("'x' not in asic_type", &facts));
    }

    #[test]
    fn test_unknown_propagation() {
        let facts = facts_with(vec![("topo_type", json!("t0"))]);
        // false and unknown is false, so its negation holds
        assert!(eval("not (topo_type == 't1' and asic_type == 'x')", &facts));
        // true or unknown is true
        assert!(eval("topo_type == 't0' or asic_type == 'x'", &facts));
        // true and unknown stays unknown
        assert_eq!(
            evaluate_tristate(&parse("topo_type == 't0' and asic_type == 'x'").unwrap(), &facts),
            None
        );
    }

    #[test]
    fn test_null_check() {
        let facts = facts_with(vec![("platform", json!(null))]);
        assert!(eval("platform == None", &facts));
        assert!(eval("missing == null", &facts));
        assert!(!eval("platform != null", &facts));
    }

    #[test]
    fn test_boolean_comparison() {
        let facts = facts_with(vec![("is_multi_asic", json!(true))]);
        assert!(eval("is_multi_asic == True", &facts));
        assert!(!eval("is_multi_asic == false", &facts));
        assert!(eval("is_multi_asic == 'True'", &facts));
    }

    #[test]
    fn test_number_and_string_equality() {
        let facts = facts_with(vec![("release", json!(202012)), ("num_asics", json!("3"))]);
        assert!(eval("release in ['202012', '202106']", &facts));
        assert!(eval("num_asics == 3", &facts));
    }

    #[test]
    fn test_number_comparison() {
        let facts = facts_with(vec![("num_asics", json!(4))]);
        assert!(eval("num_asics > 1", &facts));
        assert!(eval("num_asics >= 4", &facts));
        assert!(!eval("num_asics < 4", &facts));
        assert!(eval("num_asics <= 4.5", &facts));
    }

    #[test]
    fn test_version_comparison() {
        let facts = facts_with(vec![
            ("build_version", json!("20201231.08")),
            ("release", json!("202012")),
        ]);
        assert!(eval("build_version < '20220531.01'", &facts));
        assert!(!eval("build_version >= '20220531'", &facts));
        assert!(eval("release < 202106", &facts));
        assert!(eval("release >= '202012'", &facts));
    }

    #[test]
    fn test_incomparable_is_false() {
        let facts = facts_with(vec![("duts", json!(["a", "b"]))]);
        assert!(!eval("duts > 1", &facts));
        assert!(!eval("not duts > 1", &facts));
    }

    #[test]
    fn test_contains_array() {
        let facts = facts_with(vec![("duts", json!(["str-msn2700-01", "str-msn2700-02"]))]);
        assert!(eval("duts contains 'str-msn2700-02'", &facts));
        assert!(!eval("duts contains 'str-msn2700-03'", &facts));
    }

    #[test]
    fn test_and_or() {
        let facts = facts_with(vec![
            ("asic_type", json!("broadcom")),
            ("topo_name", json!("dualtor")),
        ]);
        assert!(eval(
            "asic_type in ['broadcom'] and topo_name in ['dualtor', 'dualtor-56']",
            &facts
        ));
        assert!(!eval(
            "asic_type in ['mellanox'] and topo_name in ['dualtor']",
            &facts
        ));
        assert!(eval(
            "asic_type in ['mellanox'] or topo_name in ['dualtor']",
            &facts
        ));
    }

    #[test]
    fn test_literal_true_false() {
        let facts = FactContext::new();
        assert!(eval("true", &facts));
        assert!(!eval("false", &facts));
        assert!(eval("not false", &facts));
    }

    #[test]
    fn test_nested_path() {
        let facts = facts_with(vec![("dut", json!({"hwsku": "Mellanox-SN2700"}))]);
        assert!(eval("dut.hwsku contains 'SN2700'", &facts));
        assert!(!eval("dut.hwsku == 'Force10-S6000'", &facts));
    }

    #[test]
    fn test_parenthesised_string_is_substring_membership() {
        let facts = facts_with(vec![("release", json!("2019"))]);
        assert!(eval("release in ('201911')", &facts));
        assert!(!eval("release in ('201911',)", &facts));
    }
}
