//! Runtime entity descriptors. An [`Entity`] tells the framework which table
//! backs a resource, how its primary key parses, and which columns exist, so
//! CRUD routes and SQL can be generated without compile-time models.

use crate::error::AppError;
use crate::service::validation::ValidationRule;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Primary key type for parsing path/body ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PkType {
    Uuid,
    BigInt,
    Int,
    Text,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// PostgreSQL type name, used to coerce string query filters (e.g. "bool",
    /// "bigint", "uuid"). `None` leaves filters as strings.
    pub pg_type: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Entity {
    /// Logical name, e.g. "User". Keys the CRUD registry.
    pub name: String,
    /// Backing table name.
    pub table: String,
    /// URL segment for generated routes, derived from the name.
    pub path_segment: String,
    pub pk_column: String,
    pub pk_type: PkType,
    /// Declared columns. When non-empty, inserts/updates/filters are limited
    /// to these names.
    pub columns: Vec<ColumnInfo>,
    /// Column names stripped from every response (e.g. password hashes).
    pub sensitive_columns: HashSet<String>,
    pub validation: HashMap<String, ValidationRule>,
}

impl Entity {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let name = name.into();
        Entity {
            path_segment: pluralize(&name.to_lowercase()),
            name,
            table: table.into(),
            pk_column: "id".to_string(),
            pk_type: PkType::BigInt,
            columns: Vec::new(),
            sensitive_columns: HashSet::new(),
            validation: HashMap::new(),
        }
    }

    pub fn pk(mut self, column: impl Into<String>, pk_type: PkType) -> Self {
        self.pk_column = column.into();
        self.pk_type = pk_type;
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnInfo {
            name: name.into(),
            pg_type: None,
        });
        self
    }

    pub fn typed_column(mut self, name: impl Into<String>, pg_type: impl Into<String>) -> Self {
        self.columns.push(ColumnInfo {
            name: name.into(),
            pg_type: Some(pg_type.into()),
        });
        self
    }

    pub fn sensitive(mut self, column: impl Into<String>) -> Self {
        self.sensitive_columns.insert(column.into());
        self
    }

    pub fn validate(mut self, column: impl Into<String>, rule: ValidationRule) -> Self {
        self.validation.insert(column.into(), rule);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_info(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Parse a path id segment according to the pk type.
    pub fn parse_id(&self, id_str: &str) -> Result<Value, AppError> {
        Ok(match self.pk_type {
            PkType::Uuid => {
                let u = uuid::Uuid::parse_str(id_str)
                    .map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
                Value::String(u.to_string())
            }
            PkType::BigInt | PkType::Int => {
                let n: i64 = id_str
                    .parse()
                    .map_err(|_| AppError::BadRequest("invalid id".into()))?;
                Value::Number(n.into())
            }
            PkType::Text => Value::String(id_str.to_string()),
        })
    }

    /// Coerce a string query filter to the declared column type.
    pub fn coerce_query_value(&self, column: &str, s: &str) -> Value {
        let pg_type = self
            .column_info(column)
            .and_then(|c| c.pg_type.as_deref())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if column == self.pk_column {
            if let Ok(v) = self.parse_id(s) {
                return v;
            }
        }
        if pg_type.contains("uuid") {
            if let Ok(u) = uuid::Uuid::parse_str(s) {
                return Value::String(u.to_string());
            }
        }
        if pg_type.contains("int") || pg_type.contains("serial") {
            if let Ok(n) = s.parse::<i64>() {
                return Value::Number(n.into());
            }
        }
        if pg_type.starts_with("bool") {
            if s.eq_ignore_ascii_case("true") {
                return Value::Bool(true);
            }
            if s.eq_ignore_ascii_case("false") {
                return Value::Bool(false);
            }
        }
        Value::String(s.to_string())
    }

    /// Remove sensitive columns from a response row in place.
    pub fn strip_sensitive(&self, row: &mut Value) {
        if let Value::Object(map) = row {
            for col in &self.sensitive_columns {
                map.remove(col);
            }
        }
    }
}

/// Route segment pluralization: trailing `s` appended unless already present.
pub fn pluralize(name: &str) -> String {
    if name.ends_with('s') {
        name.to_string()
    } else {
        format!("{}s", name)
    }
}
