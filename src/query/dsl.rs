//! Backend-grammar DSL handling: dialect repair and clause splitting.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Textual substitutions reconciling the query-language service's output
/// with the backend grammar. Applied in order after quote normalization.
const DIALECT_REPAIRS: &[(&str, &str)] = &[
    ("WITH META_VALUE", "AND META_VALUE"),
    ("DIRECTORY_NAME IS", "PATH IS"),
];

/// Repair a DSL string produced by the query-language service so the backend
/// parser accepts it.
pub fn repair_dsl(raw: &str) -> String {
    let mut dsl = raw.replace('\'', "\"");
    for (from, to) in DIALECT_REPAIRS {
        dsl = dsl.replace(from, to);
    }
    dsl
}

/// One constraint of a structured query, e.g. `PATH IS "/home/me"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntity {
    pub field: String,
    pub op: String,
    pub value: String,
}

impl QueryEntity {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive field comparison.
    pub fn is_field(&self, field: &str) -> bool {
        self.field.eq_ignore_ascii_case(field)
    }
}

impl std::fmt::Display for QueryEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} \"{}\"", self.field, self.op, self.value)
    }
}

/// Ordered, immutable entity sequence shared read-only by every backend task
/// of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredQuery {
    entities: Arc<[QueryEntity]>,
}

impl StructuredQuery {
    pub fn new(entities: Vec<QueryEntity>) -> Self {
        Self {
            entities: entities.into(),
        }
    }

    pub fn entities(&self) -> &[QueryEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Values of every entity whose field matches one of `fields`.
    pub fn values_for<'a>(&'a self, fields: &'a [&str]) -> impl Iterator<Item = &'a str> + 'a {
        self.entities
            .iter()
            .filter(move |entity| fields.iter().any(|field| entity.is_field(field)))
            .map(|entity| entity.value.as_str())
    }
}

/// Turns a repaired DSL string into structured entities.
pub trait EntityParser: Send + Sync {
    fn parse(&self, dsl: &str) -> Vec<QueryEntity>;
}

/// Splits a DSL string on top-level `AND` into `FIELD OP VALUE` clauses.
///
/// Clauses without that shape are dropped. Quoted values may contain `AND`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseParser;

impl EntityParser for ClauseParser {
    fn parse(&self, dsl: &str) -> Vec<QueryEntity> {
        let tokens = tokenize(dsl);
        tokens
            .split(|token| token.eq_ignore_ascii_case("AND"))
            .filter_map(parse_clause)
            .collect()
    }
}

fn parse_clause(tokens: &[String]) -> Option<QueryEntity> {
    let (field, rest) = tokens.split_first()?;
    let (op, mut rest) = rest.split_first()?;

    let mut op = op.to_ascii_uppercase();
    if op == "IS" {
        if let Some((next, tail)) = rest.split_first() {
            if next.eq_ignore_ascii_case("NOT") {
                op.push_str(" NOT");
                rest = tail;
            }
        }
    }

    let value = rest
        .iter()
        .map(|token| unquote(token))
        .collect::<Vec<_>>()
        .join(" ");
    if value.is_empty() || field.starts_with('"') {
        return None;
    }

    Some(QueryEntity::new(field.to_ascii_uppercase(), op, value))
}

/// Whitespace tokenizer that keeps double-quoted runs (quotes included)
/// together.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(token)
}
