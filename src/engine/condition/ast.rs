// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for condition expressions

/// A condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Comparison expression: fact op literal
    Compare {
        left: String,
        op: CompareOp,
        right: Literal,
    },
    /// Logical AND
    And(Box<Expression>, Box<Expression>),
    /// Logical OR
    Or(Box<Expression>, Box<Expression>),
    /// Logical NOT
    Not(Box<Expression>),
    /// Literal true
    True,
    /// Literal false
    False,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// fact in [..]
    In,
    /// fact not in [..]
    NotIn,
    /// fact contains literal (substring or element); also `'x' in fact`
    Contains,
    /// `'x' not in fact`
    NotContains,
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    List(Vec<Literal>),
    Null,
}

impl Expression {
    /// Collect every fact name referenced by this expression
    pub fn attributes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Compare { left, .. } => {
                if !out.contains(&left.as_str()) {
                    out.push(left);
                }
            }
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.collect_attributes(out);
                r.collect_attributes(out);
            }
            Expression::Not(inner) => inner.collect_attributes(out),
            Expression::True | Expression::False => {}
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::In => write!(f, "in"),
            CompareOp::NotIn => write!(f, "not in"),
            CompareOp::Contains => write!(f, "contains"),
            CompareOp::NotContains => write!(f, "not contains"),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expression::And(l, r) => write!(f, "({} and {})", l, r),
            Expression::Or(l, r) => write!(f, "({} or {})", l, r),
            Expression::Not(inner) => write!(f, "not {}", inner),
            Expression::True => write!(f, "true"),
            Expression::False => write!(f, "false"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_display() {
        assert_eq!(format!("{}", CompareOp::Eq), "==");
        assert_eq!(format!("{}", CompareOp::NotEq), "!=");
        assert_eq!(format!("{}", CompareOp::Gte), ">=");
        assert_eq!(format!("{}", CompareOp::In), "in");
        assert_eq!(format!("{}", CompareOp::NotIn), "not in");
    }

    #[test]
    fn test_expression_display() {
        let expr = Expression::And(
            Box::new(Expression::Compare {
                left: "asic_type".to_string(),
                op: CompareOp::In,
                right: Literal::List(vec![Literal::String("broadcom".to_string())]),
            }),
            Box::new(Expression::Not(Box::new(Expression::True))),
        );
        assert_eq!(
            expr.to_string(),
            "(asic_type in ['broadcom'] and not true)"
        );
    }

    #[test]
    fn test_attributes_deduplicated() {
        let cmp = |name: &str| Expression::Compare {
            left: name.to_string(),
            op: CompareOp::Eq,
            right: Literal::Null,
        };
        let expr = Expression::Or(
            Box::new(Expression::And(Box::new(cmp("a")), Box::new(cmp("b")))),
            Box::new(cmp("a")),
        );
        assert_eq!(expr.attributes(), vec!["a", "b"]);
    }
}
