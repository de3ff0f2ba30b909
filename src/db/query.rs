//! Collection queries: field filters, ordering and limits over JSON documents.
//!
//! Field paths address top-level or nested document fields (`status`,
//! `insurance.provider`) and are compiled to `json_extract` expressions.
//! Values are always bound as parameters; field paths are validated against
//! a strict identifier pattern before they reach the SQL text.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DatabaseError;

static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*$").expect("static field path pattern")
});

/// Document-level fields stored as columns, not inside the JSON body.
const COLUMN_FIELDS: [(&str, &str); 4] = [
    ("id", "id"),
    ("version", "version"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "array-contains")]
    ArrayContains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: Direction,
}

/// A caller-supplied filter/order/limit list for one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Compile a query into a SELECT over `documents` plus its bound parameters.
pub(crate) fn build_select(
    collection: &str,
    query: &Query,
) -> Result<(String, Vec<SqlValue>), DatabaseError> {
    let mut sql = String::from(
        "SELECT id, data, version, created_at, updated_at FROM documents WHERE collection = ?",
    );
    let mut params = vec![SqlValue::Text(collection.to_string())];

    for filter in &query.filters {
        if filter.op == FilterOp::ArrayContains {
            // json_each needs the raw path, not the extracted value.
            validate_field(&filter.field)?;
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM json_each(documents.data, '{}') WHERE json_each.value = ?)",
                json_path(&filter.field)
            ));
            params.push(scalar(&filter.value)?);
            continue;
        }
        let target = field_expr(&filter.field)?;
        match filter.op {
            FilterOp::Eq if filter.value.is_null() => {
                sql.push_str(&format!(" AND {target} IS NULL"));
            }
            FilterOp::Ne if filter.value.is_null() => {
                sql.push_str(&format!(" AND {target} IS NOT NULL"));
            }
            FilterOp::Eq | FilterOp::Ne | FilterOp::Lt | FilterOp::Le | FilterOp::Gt | FilterOp::Ge => {
                let op = match filter.op {
                    FilterOp::Eq => "=",
                    FilterOp::Ne => "!=",
                    FilterOp::Lt => "<",
                    FilterOp::Le => "<=",
                    FilterOp::Gt => ">",
                    _ => ">=",
                };
                // A field that is absent never matches, including for `!=`.
                sql.push_str(&format!(" AND {target} IS NOT NULL AND {target} {op} ?"));
                params.push(scalar(&filter.value)?);
            }
            FilterOp::In => {
                let values = filter.value.as_array().ok_or_else(|| {
                    DatabaseError::InvalidQuery(format!(
                        "'in' filter on {} requires an array value",
                        filter.field
                    ))
                })?;
                if values.is_empty() {
                    sql.push_str(" AND 0");
                    continue;
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!(" AND {target} IN ({placeholders})"));
                for v in values {
                    params.push(scalar(v)?);
                }
            }
            FilterOp::ArrayContains => unreachable!("handled above"),
        }
    }

    if query.order_by.is_empty() {
        sql.push_str(" ORDER BY created_at ASC, id ASC");
    } else {
        let mut clauses = Vec::with_capacity(query.order_by.len());
        for order in &query.order_by {
            let target = field_expr(&order.field)?;
            let dir = match order.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            clauses.push(format!("{target} {dir}"));
        }
        clauses.push("id ASC".to_string());
        sql.push_str(&format!(" ORDER BY {}", clauses.join(", ")));
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(SqlValue::Integer(i64::from(limit)));
    }

    Ok((sql, params))
}

/// SQL expression for a field. The path is inlined only after validation,
/// so it can never contain quotes.
fn field_expr(field: &str) -> Result<String, DatabaseError> {
    validate_field(field)?;
    if let Some((_, column)) = COLUMN_FIELDS.iter().find(|(name, _)| *name == field) {
        return Ok((*column).to_string());
    }
    Ok(format!("json_extract(documents.data, '{}')", json_path(field)))
}

pub(crate) fn validate_field(field: &str) -> Result<(), DatabaseError> {
    if FIELD_PATH.is_match(field) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidQuery(format!("invalid field path: {field:?}")))
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

/// Convert a JSON scalar into the SQL value `json_extract` would yield.
fn scalar(value: &Value) -> Result<SqlValue, DatabaseError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| DatabaseError::InvalidQuery(format!("unsupported number {n}"))),
        },
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(DatabaseError::InvalidQuery(
            "filter values must be scalars".into(),
        )),
    }
}
