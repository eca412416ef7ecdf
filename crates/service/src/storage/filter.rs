//! Filter expressions evaluated against decoded object bodies.
//!
//! Wire format: `[and|or|not] <property> <op> <value>` repeated, separated by
//! whitespace. String literals are single-quoted (`''` escapes a quote inside
//! them); numbers and dates are bare.
//!
//! Every clause is applied as a conjunction. The connective of each clause is
//! parsed and kept on the [`Clause`] but does not change evaluation: existing
//! clients rely on `or`/`not` behaving like `and`.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::query::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
    Not,
}

impl Connective {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// contains
    Co,
    /// starts with
    Sw,
    /// ends with
    Ew,
}

impl Operator {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "co" => Some(Self::Co),
            "sw" => Some(Self::Sw),
            "ew" => Some(Self::Ew),
            _ => None,
        }
    }
}

/// Clause literal after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Date(DateTime<Utc>),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub connective: Connective,
    pub property: String,
    pub op: Operator,
    pub literal: Literal,
    /// literal text with quotes removed; used by the substring operators
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Bare(String),
    Quoted(String),
}

impl Token {
    fn text(&self) -> &str {
        match self {
            Token::Bare(s) | Token::Quoted(s) => s,
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '\'' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, ch)) = chars.next() {
                if ch == '\'' {
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                        text.push('\'');
                        continue;
                    }
                    closed = true;
                    break;
                }
                text.push(ch);
            }
            if !closed {
                return Err(QueryError::UnterminatedQuote(start));
            }
            tokens.push(Token::Quoted(text));
        } else {
            let mut text = String::new();
            while let Some(&(_, ch)) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                text.push(ch);
                chars.next();
            }
            tokens.push(Token::Bare(text));
        }
    }
    Ok(tokens)
}

pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Date first, then number, then string. Quoted literals are always strings.
fn classify(token: &Token) -> Literal {
    match token {
        Token::Quoted(s) => Literal::Text(s.clone()),
        Token::Bare(s) => {
            if let Some(dt) = parse_date(s) {
                Literal::Date(dt)
            } else if let Some(n) = parse_number(s) {
                Literal::Number(n)
            } else {
                Literal::Text(s.clone())
            }
        }
    }
}

impl Filter {
    /// Parse a filter expression. Blank input yields an empty filter that matches everything.
    pub fn parse(src: &str) -> Result<Self, QueryError> {
        let tokens = tokenize(src)?;
        let mut clauses = Vec::new();
        let mut it = tokens.iter().peekable();

        while it.peek().is_some() {
            let mut connective = Connective::And;
            // a connective needs a whole clause after it; a word followed by an operator is a property
            while let Some(Token::Bare(word)) = it.peek().copied() {
                let names_property = matches!(it.clone().nth(1), Some(Token::Bare(w)) if Operator::parse(w).is_some());
                match Connective::parse(word) {
                    Some(c) if it.len() > 3 && !names_property => {
                        connective = c;
                        it.next();
                    }
                    _ => break,
                }
            }

            let property = it
                .next()
                .ok_or_else(|| QueryError::IncompleteClause("missing property".into()))?;
            let property = property.text().to_string();
            if property.is_empty() {
                return Err(QueryError::IncompleteClause("empty property name".into()));
            }

            let op_token = it
                .next()
                .ok_or_else(|| QueryError::IncompleteClause(format!("missing operator after '{property}'")))?;
            let op = match op_token {
                Token::Bare(word) => Operator::parse(word),
                Token::Quoted(_) => None,
            }
            .ok_or_else(|| QueryError::UnknownOperator(op_token.text().to_string()))?;

            let value = it
                .next()
                .ok_or_else(|| QueryError::IncompleteClause(format!("missing value after '{property}'")))?;

            clauses.push(Clause {
                connective,
                property,
                op,
                literal: classify(value),
                text: value.text().to_string(),
            });
        }

        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] { &self.clauses }

    pub fn is_empty(&self) -> bool { self.clauses.is_empty() }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|c| c.matches(doc))
    }
}

/// Walk a dotted path (`stats.level`) through nested objects.
pub(crate) fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |v, seg| v.get(seg))
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_uppercase)
        .cmp(b.chars().flat_map(char::to_uppercase))
}

fn ordered(op: Operator, ord: Ordering) -> bool {
    match op {
        Operator::Eq => ord == Ordering::Equal,
        Operator::Ne => ord != Ordering::Equal,
        Operator::Gt => ord == Ordering::Greater,
        Operator::Ge => ord != Ordering::Less,
        Operator::Lt => ord == Ordering::Less,
        Operator::Le => ord != Ordering::Greater,
        Operator::Co | Operator::Sw | Operator::Ew => false,
    }
}

impl Clause {
    pub fn matches(&self, doc: &Value) -> bool {
        let value = match lookup(doc, &self.property) {
            Some(Value::Null) | None => return false,
            Some(v) => v,
        };

        if matches!(self.op, Operator::Co | Operator::Sw | Operator::Ew) {
            let Some(s) = text_of(value) else { return false };
            return match self.op {
                Operator::Co => s.contains(&self.text),
                Operator::Sw => s.starts_with(&self.text),
                _ => s.ends_with(&self.text),
            };
        }

        match &self.literal {
            Literal::Number(n) => match number_of(value).and_then(|v| v.partial_cmp(n)) {
                Some(ord) => ordered(self.op, ord),
                None => false,
            },
            Literal::Date(d) => match value.as_str().and_then(parse_date) {
                Some(v) => ordered(self.op, v.cmp(d)),
                None => false,
            },
            Literal::Text(t) => {
                let Some(s) = text_of(value) else { return false };
                match self.op {
                    Operator::Eq => s == *t,
                    Operator::Ne => s != *t,
                    // prefix match, not lexicographic
                    Operator::Gt | Operator::Ge => s.starts_with(t.as_str()),
                    Operator::Lt | Operator::Le => ordered(self.op, compare_ignore_case(&s, t)),
                    Operator::Co | Operator::Sw | Operator::Ew => false,
                }
            }
        }
    }
}
