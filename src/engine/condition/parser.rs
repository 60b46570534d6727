//! Condition expression parser
//!
//! Parses expressions like:
//! - `asic_type == 'broadcom'`
//! - `topo_name in ['dualtor', 'dualtor-56']`
//! - `release not in ['201811'] and not is_multi_asic == True`
//! - `'t2' in topo_name or (platform == "x86_64-arista_7050_qx32s" and build_version < '20220531')`
//!
//! Precedence from loosest to tightest: `or`, `and`, `not`, comparison.

use super::ast::{CompareOp, Expression, Literal};
use crate::engine::error::ExpressionError;

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ExpressionError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error_at(tok.offset, "Unexpected trailing input"));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Num(f64),
    Op(CompareOp),
    And,
    Or,
    Not,
    In,
    Contains,
    Bool(bool),
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let simple = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = simple {
            tokens.push(Token { kind, offset });
            i += 1;
            continue;
        }

        // Two-character operators first
        let next = chars.get(i + 1).map(|(_, c)| *c);
        let op = match (c, next) {
            ('=', Some('=')) => Some((CompareOp::Eq, 2)),
            ('!', Some('=')) => Some((CompareOp::NotEq, 2)),
            ('>', Some('=')) => Some((CompareOp::Gte, 2)),
            ('<', Some('=')) => Some((CompareOp::Lte, 2)),
            ('>', _) => Some((CompareOp::Gt, 1)),
            ('<', _) => Some((CompareOp::Lt, 1)),
            _ => None,
        };
        if let Some((op, width)) = op {
            tokens.push(Token {
                kind: TokenKind::Op(op),
                offset,
            });
            i += width;
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            let mut value = String::new();
            let mut j = i + 1;
            let mut closed = false;
            while j < chars.len() {
                let (_, ch) = chars[j];
                if ch == '\\' && j + 1 < chars.len() {
                    value.push(chars[j + 1].1);
                    j += 2;
                    continue;
                }
                if ch == quote {
                    closed = true;
                    break;
                }
                value.push(ch);
                j += 1;
            }
            if !closed {
                return Err(ExpressionError::new(
                    input,
                    offset,
                    "Unterminated string literal",
                ));
            }
            tokens.push(Token {
                kind: TokenKind::Str(value),
                offset,
            });
            i = j + 1;
            continue;
        }

        let starts_number =
            c.is_ascii_digit() || (c == '-' && next.map(|n| n.is_ascii_digit()).unwrap_or(false));
        if starts_number {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].1.is_ascii_digit() || chars[j].1 == '.') {
                j += 1;
            }
            let end = chars.get(j).map(|(o, _)| *o).unwrap_or(input.len());
            let text = &input[offset..end];
            let n = text.parse::<f64>().map_err(|_| {
                ExpressionError::new(input, offset, format!("Invalid number '{}'", text))
            })?;
            tokens.push(Token {
                kind: TokenKind::Num(n),
                offset,
            });
            i = j;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut j = i + 1;
            while j < chars.len() && is_ident_char(chars[j].1) {
                j += 1;
            }
            let end = chars.get(j).map(|(o, _)| *o).unwrap_or(input.len());
            let word = &input[offset..end];
            let kind = match word {
                "and" => TokenKind::And,
                "or" => TokenKind::Or,
                "not" => TokenKind::Not,
                "in" => TokenKind::In,
                "contains" => TokenKind::Contains,
                "true" | "True" => TokenKind::Bool(true),
                "false" | "False" => TokenKind::Bool(false),
                "null" | "None" => TokenKind::Null,
                _ => TokenKind::Ident(word.to_string()),
            };
            tokens.push(Token { kind, offset });
            i = j;
            continue;
        }

        return Err(ExpressionError::new(
            input,
            offset,
            format!("Unexpected character '{}'", c),
        ));
    }

    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn offset(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.input.len())
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> ExpressionError {
        ExpressionError::new(self.input, offset, message)
    }

    fn error_here(&self, message: impl Into<String>) -> ExpressionError {
        self.error_at(self.offset(), message)
    }

    fn parse_or(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, ExpressionError> {
        if self.eat(&TokenKind::Not) {
            let inner = self.parse_not()?;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ExpressionError> {
        match self.peek_kind() {
            None => Err(self.error_here("Unexpected end of expression")),
            Some(TokenKind::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if !self.eat(&TokenKind::RParen) {
                    return Err(self.error_here("Expected ')'"));
                }
                Ok(inner)
            }
            Some(TokenKind::Bool(b)) if !self.literal_followed_by_in() => {
                let value = *b;
                self.pos += 1;
                Ok(if value {
                    Expression::True
                } else {
                    Expression::False
                })
            }
            Some(TokenKind::Ident(_)) => self.parse_comparison(),
            Some(TokenKind::Str(_)) | Some(TokenKind::Num(_)) | Some(TokenKind::Bool(_)) => {
                self.parse_membership()
            }
            Some(_) => Err(self.error_here("Expected a fact name, literal or '('")),
        }
    }

    /// `literal in fact` / `literal not in fact`
    fn literal_followed_by_in(&self) -> bool {
        matches!(
            (self.peek_kind_at(1), self.peek_kind_at(2)),
            (Some(TokenKind::In), _) | (Some(TokenKind::Not), Some(TokenKind::In))
        )
    }

    fn parse_comparison(&mut self) -> Result<Expression, ExpressionError> {
        let left = match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => name,
            _ => return Err(self.error_here("Expected a fact name")),
        };

        let op = match self.peek_kind() {
            Some(TokenKind::Op(op)) => {
                let op = *op;
                self.pos += 1;
                op
            }
            Some(TokenKind::In) => {
                self.pos += 1;
                CompareOp::In
            }
            Some(TokenKind::Not) if self.peek_kind_at(1) == Some(&TokenKind::In) => {
                self.pos += 2;
                CompareOp::NotIn
            }
            Some(TokenKind::Contains) => {
                self.pos += 1;
                CompareOp::Contains
            }
            _ => {
                return Err(self.error_here(format!(
                    "Could not parse condition: expected an operator after '{}'",
                    left
                )))
            }
        };

        let right = self.parse_literal()?;
        Ok(Expression::Compare { left, op, right })
    }

    fn parse_membership(&mut self) -> Result<Expression, ExpressionError> {
        let needle = self.parse_literal()?;
        let op = if self.eat(&TokenKind::In) {
            CompareOp::Contains
        } else if self.peek_kind() == Some(&TokenKind::Not)
            && self.peek_kind_at(1) == Some(&TokenKind::In)
        {
            self.pos += 2;
            CompareOp::NotContains
        } else {
            return Err(self.error_here("Expected 'in' or 'not in' after literal"));
        };

        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(Expression::Compare {
                left: name,
                op,
                right: needle,
            }),
            _ => Err(self.error_here("Expected a fact name after 'in'")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ExpressionError> {
        let offset = self.offset();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Str(s)) => Ok(Literal::String(s)),
            Some(TokenKind::Num(n)) => Ok(Literal::Number(n)),
            Some(TokenKind::Bool(b)) => Ok(Literal::Boolean(b)),
            Some(TokenKind::Null) => Ok(Literal::Null),
            Some(TokenKind::LBracket) => self.parse_list(TokenKind::RBracket),
            Some(TokenKind::LParen) => self.parse_list(TokenKind::RParen),
            _ => Err(self.error_at(offset, "Could not parse literal")),
        }
    }

    fn parse_list(&mut self, close: TokenKind) -> Result<Literal, ExpressionError> {
        let parenthesised = close == TokenKind::RParen;
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            if self.eat(&close) {
                break;
            }
            items.push(self.parse_literal()?);
            if self.eat(&TokenKind::Comma) {
                saw_comma = true;
                continue;
            }
            if self.eat(&close) {
                break;
            }
            return Err(self.error_here("Expected ',' or end of list"));
        }

        // `('a')` is just `'a'`; a one-element tuple needs `('a',)`
        if parenthesised && !saw_comma && items.len() == 1 {
            if let Some(item) = items.pop() {
                return Ok(item);
            }
        }
        Ok(Literal::List(items))
    }
}
