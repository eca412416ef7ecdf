//! In-memory query engine: filter, re-sort and page the rows of one type.
//!
//! Rows arrive ordered by score ascending. Bodies are decoded once, filtered
//! with [`Filter`], optionally re-sorted by a single body property and then
//! paged. The whole type is scanned; there is no index over body fields.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::domain::StorageObject;
use super::filter::{lookup, Filter};
use crate::pagination::Pagination;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("unterminated quoted literal at offset {0}")]
    UnterminatedQuote(usize),
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("incomplete clause: {0}")]
    IncompleteClause(String),
    #[error("invalid orderBy '{0}'")]
    InvalidOrderBy(String),
}

/// `<property>[ asc|desc]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub property: String,
    pub descending: bool,
}

impl OrderBy {
    /// Blank input means "keep the score order".
    pub fn parse(src: &str) -> Result<Option<Self>, QueryError> {
        let parts: Vec<&str> = src.split_whitespace().collect();
        match parts.as_slice() {
            [] => Ok(None),
            [property] => Ok(Some(Self { property: property.to_string(), descending: false })),
            [property, dir] => match dir.to_ascii_lowercase().as_str() {
                "desc" => Ok(Some(Self { property: property.to_string(), descending: true })),
                "asc" => Ok(Some(Self { property: property.to_string(), descending: false })),
                _ => Err(QueryError::InvalidOrderBy(src.to_string())),
            },
            _ => Err(QueryError::InvalidOrderBy(src.to_string())),
        }
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over optional JSON values: missing/null < bool < number < string.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Everything a query needs once the wire parameters are parsed.
#[derive(Debug, Clone, Default)]
pub struct CompiledQuery {
    pub filter: Filter,
    pub order_by: Option<OrderBy>,
    pub page: Pagination,
}

impl CompiledQuery {
    pub fn compile(filter: Option<&str>, order_by: Option<&str>, page: Pagination) -> Result<Self, QueryError> {
        let filter = match filter {
            Some(f) => Filter::parse(f)?,
            None => Filter::default(),
        };
        let order_by = match order_by {
            Some(o) => OrderBy::parse(o)?,
            None => None,
        };
        Ok(Self { filter, order_by, page })
    }

    /// Run over rows already ordered by score ascending.
    pub fn run(&self, rows: Vec<StorageObject>) -> Vec<StorageObject> {
        let total = rows.len();
        let mut decoded: Vec<(StorageObject, Value)> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_str::<Value>(&row.object_data) {
                Ok(doc) => Some((row, doc)),
                Err(e) => {
                    debug!(object_id = %row.object_id, error = %e, "skip undecodable body");
                    None
                }
            })
            .filter(|(_, doc)| self.filter.matches(doc))
            .collect();

        if let Some(order) = &self.order_by {
            // stable: ties keep score order
            decoded.sort_by(|(_, a), (_, b)| {
                let ord = compare_values(lookup(a, &order.property), lookup(b, &order.property));
                if order.descending { ord.reverse() } else { ord }
            });
        }

        let (skip, top) = self.page.normalize();
        let out: Vec<StorageObject> = decoded.into_iter().skip(skip).take(top).map(|(row, _)| row).collect();
        debug!(scanned = total, returned = out.len(), "query evaluated");
        out
    }
}
