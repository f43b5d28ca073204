//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from an entity descriptor.

use crate::entity::Entity;
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier for PostgreSQL. Identifiers come from entity descriptors
/// or are checked against them before reaching here.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// SELECT list: declared columns when the entity has them, `*` otherwise.
fn select_column_list(entity: &Entity) -> String {
    if entity.columns.is_empty() {
        "*".to_string()
    } else {
        entity
            .columns
            .iter()
            .map(|c| quoted(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// SELECT list with exact-match filters, ordered by pk for stable pagination.
pub fn select_list(
    entity: &Entity,
    filters: &[(String, Value)],
    limit: Option<u32>,
    offset: Option<u32>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {}",
        select_column_list(entity),
        quoted(&entity.table)
    );
    let mut conditions = Vec::with_capacity(filters.len());
    for (col, val) in filters {
        let n = q.push_param(val.clone());
        conditions.push(format!("{} = ${}", quoted(col), n));
    }
    if !conditions.is_empty() {
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&conditions.join(" AND "));
    }
    q.sql
        .push_str(&format!(" ORDER BY {}", quoted(&entity.pk_column)));
    if let Some(limit) = limit {
        q.sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = offset {
        q.sql.push_str(&format!(" OFFSET {}", offset));
    }
    q
}

/// SELECT by primary key. Caller binds the id as the sole param.
pub fn select_by_id(entity: &Entity) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(entity),
        quoted(&entity.table),
        quoted(&entity.pk_column)
    );
    q
}

/// INSERT from a body map, RETURNING the created row. Body keys become the
/// column list; callers validate keys against the entity first. An empty body
/// inserts a row of defaults.
pub fn insert(entity: &Entity, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    if body.is_empty() {
        q.sql = format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING *",
            quoted(&entity.table)
        );
        return q;
    }
    let mut cols: Vec<&String> = body.keys().collect();
    cols.sort();
    let mut placeholders = Vec::with_capacity(cols.len());
    for col in &cols {
        let n = q.push_param(body[*col].clone());
        placeholders.push(format!("${}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quoted(&entity.table),
        cols.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by primary key, setting only the body's columns, RETURNING the row.
pub fn update(entity: &Entity, id: &Value, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols: Vec<&String> = body.keys().collect();
    cols.sort();
    let mut assignments = Vec::with_capacity(cols.len());
    for col in &cols {
        let n = q.push_param(body[*col].clone());
        assignments.push(format!("{} = ${}", quoted(col), n));
    }
    let id_n = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING *",
        quoted(&entity.table),
        assignments.join(", "),
        quoted(&entity.pk_column),
        id_n
    );
    q
}

/// DELETE by primary key, RETURNING the deleted row. Caller binds the id.
pub fn delete(entity: &Entity) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING *",
        quoted(&entity.table),
        quoted(&entity.pk_column)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_entity() -> Entity {
        Entity::new("User", "users")
            .column("id")
            .column("name")
            .column("email")
    }

    #[test]
    fn select_list_filters_and_paginates() {
        let q = select_list(
            &user_entity(),
            &[("name".to_string(), json!("ada"))],
            Some(10),
            Some(20),
        );
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"name\", \"email\" FROM \"users\" WHERE \"name\" = $1 ORDER BY \"id\" LIMIT 10 OFFSET 20"
        );
        assert_eq!(q.params, vec![json!("ada")]);
    }

    #[test]
    fn select_star_when_no_columns_declared() {
        let q = select_by_id(&Entity::new("Thing", "things"));
        assert_eq!(q.sql, "SELECT * FROM \"things\" WHERE \"id\" = $1");
    }

    #[test]
    fn insert_orders_columns_deterministically() {
        let mut body = HashMap::new();
        body.insert("name".to_string(), json!("ada"));
        body.insert("email".to_string(), json!("ada@example.com"));
        let q = insert(&user_entity(), &body);
        assert_eq!(
            q.sql,
            "INSERT INTO \"users\" (\"email\", \"name\") VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(q.params, vec![json!("ada@example.com"), json!("ada")]);
    }

    #[test]
    fn empty_insert_body_falls_back_to_defaults() {
        let q = insert(&user_entity(), &HashMap::new());
        assert_eq!(q.sql, "INSERT INTO \"users\" DEFAULT VALUES RETURNING *");
        assert!(q.params.is_empty());
    }

    #[test]
    fn update_sets_body_columns_and_binds_id_last() {
        let mut body = HashMap::new();
        body.insert("name".to_string(), json!("grace"));
        let q = update(&user_entity(), &json!(7), &body);
        assert_eq!(
            q.sql,
            "UPDATE \"users\" SET \"name\" = $1 WHERE \"id\" = $2 RETURNING *"
        );
        assert_eq!(q.params, vec![json!("grace"), json!(7)]);
    }

    #[test]
    fn delete_returns_the_row() {
        let q = delete(&user_entity());
        assert_eq!(q.sql, "DELETE FROM \"users\" WHERE \"id\" = $1 RETURNING *");
    }
}
