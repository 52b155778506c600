//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resource's persisted columns.

use crate::config::{ColumnConfig, DataType, ResourceConfig};
use crate::error::AppError;
use crate::store::{Filter, ListQuery, Record, SortDirection};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from config).
pub fn quoted(s: &str) -> String {
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

    /// Push a value and return its placeholder, cast to the column type.
    fn push_param(&mut self, v: Value, data_type: DataType) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), data_type.pg_type())
    }
}

/// Escape `\`, `%` and `_` so a needle matches literally inside LIKE.
pub fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// SELECT list: decimal and time as col::text so they decode as String.
fn select_column_list(resource: &ResourceConfig) -> String {
    resource
        .persisted_columns()
        .map(|c| {
            let q = quoted(&c.name);
            match c.data_type {
                DataType::Decimal | DataType::Time => format!("{}::text AS {}", q, q),
                _ => q,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Column a query may filter or sort on. Virtual and unknown columns are a bad request.
pub fn persisted_column<'a>(resource: &'a ResourceConfig, name: &str) -> Result<&'a ColumnConfig, AppError> {
    resource
        .column(name)
        .filter(|c| c.is_persisted())
        .ok_or_else(|| AppError::BadRequest(format!("unknown column '{}' on {}", name, resource.id)))
}

fn where_clause(resource: &ResourceConfig, filters: &[Filter], q: &mut QueryBuf) -> Result<String, AppError> {
    let mut parts = Vec::new();
    for f in filters {
        let col = persisted_column(resource, f.column())?;
        let name = quoted(&col.name);
        match f {
            Filter::Eq(_, Value::Null) => parts.push(format!("{} IS NULL", name)),
            Filter::Eq(_, v) => {
                let ph = q.push_param(v.clone(), col.data_type);
                parts.push(format!("{} = {}", name, ph));
            }
            Filter::Like(_, needle) => {
                let ph = q.push_param(Value::String(format!("%{}%", escape_like(needle))), DataType::Text);
                parts.push(format!("{}::text LIKE {}", name, ph));
            }
            Filter::In(_, values) if values.is_empty() => parts.push("1 = 0".to_string()),
            Filter::In(_, values) => {
                let phs: Vec<String> = values
                    .iter()
                    .map(|v| q.push_param(v.clone(), col.data_type))
                    .collect();
                parts.push(format!("{} IN ({})", name, phs.join(", ")));
            }
        }
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

/// SELECT by primary key. Caller binds nothing else: the id is the sole param.
pub fn select_by_id(resource: &ResourceConfig, id: &Value) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = resource.primary_key()?;
    let ph = q.push_param(id.clone(), pk.data_type);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(resource),
        quoted(&resource.table),
        quoted(&pk.name),
        ph
    );
    Ok(q)
}

/// SELECT list with filters, ORDER BY the requested sorts then pk, LIMIT/OFFSET with defaults applied.
pub fn select_list(resource: &ResourceConfig, query: &ListQuery) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = resource.primary_key()?;
    let where_sql = where_clause(resource, &query.filters, &mut q)?;

    let mut order = Vec::new();
    for s in &query.sort {
        let col = persisted_column(resource, &s.column)?;
        let dir = match s.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        order.push(format!("{} {}", quoted(&col.name), dir));
    }
    if !query.sort.iter().any(|s| s.column == pk.name) {
        order.push(format!("{} ASC", quoted(&pk.name)));
    }

    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(resource),
        quoted(&resource.table),
        where_sql,
        order.join(", "),
        query.effective_limit(),
        query.effective_offset()
    );
    Ok(q)
}

/// INSERT every persisted column present in the record.
pub fn insert(resource: &ResourceConfig, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in resource.persisted_columns() {
        let Some(val) = record.get(&c.name) else { continue };
        placeholders.push(q.push_param(val.clone(), c.data_type));
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(resource);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(&resource.table), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(&resource.table),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET only persisted, non-pk columns present in changes.
/// With nothing to set this degrades to a SELECT by id.
pub fn update(resource: &ResourceConfig, id: &Value, changes: &Record) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = resource.primary_key()?;
    let mut sets = Vec::new();
    for c in resource.persisted_columns().filter(|c| c.name != pk.name) {
        let Some(val) = changes.get(&c.name) else { continue };
        let ph = q.push_param(val.clone(), c.data_type);
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    if sets.is_empty() {
        return select_by_id(resource, id);
    }
    let id_ph = q.push_param(id.clone(), pk.data_type);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(&resource.table),
        sets.join(", "),
        quoted(&pk.name),
        id_ph,
        select_column_list(resource)
    );
    Ok(q)
}

/// DELETE by id.
pub fn delete(resource: &ResourceConfig, id: &Value) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let pk = resource.primary_key()?;
    let ph = q.push_param(id.clone(), pk.data_type);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(&resource.table),
        quoted(&pk.name),
        ph,
        quoted(&pk.name)
    );
    Ok(q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, RecordLabel};
    use crate::store::Sort;
    use serde_json::json;

    fn post() -> ResourceConfig {
        let mut r = ResourceConfig::new("post", "post", "maindb", "Posts", RecordLabel::new("", "title"));
        r.columns = vec![
            ColumnConfig::new("id", DataType::String).primary_key(),
            ColumnConfig::new("title", DataType::String),
            ColumnConfig::new("published", DataType::Boolean),
            ColumnConfig::new("createdAt", DataType::DateTime),
            ColumnConfig::new("views", DataType::Decimal),
            ColumnConfig::new("password", DataType::String).virtual_column(),
        ];
        r
    }

    #[test]
    fn list_renders_filters_sort_and_paging() {
        let query = ListQuery {
            filters: vec![
                Filter::Eq("published".into(), json!(true)),
                Filter::Like("title".into(), "50%_off".into()),
            ],
            sort: vec![Sort::desc("createdAt")],
            limit: Some(10),
            offset: Some(20),
        };
        let q = select_list(&post(), &query).unwrap();
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"title\", \"published\", \"createdAt\", \"views\"::text AS \"views\" FROM \"post\" \
             WHERE \"published\" = $1::boolean AND \"title\"::text LIKE $2::text \
             ORDER BY \"createdAt\" DESC, \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(q.params, vec![json!(true), json!("%50\\%\\_off%")]);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let query = ListQuery::filtered(vec![Filter::In("id".into(), vec![])]);
        let q = select_list(&post(), &query).unwrap();
        assert!(q.sql.contains("WHERE 1 = 0"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn virtual_columns_are_never_written() {
        let rec = json!({"id": "a", "title": "t", "password": "secret"}).as_object().cloned().unwrap();
        let q = insert(&post(), &rec);
        assert!(!q.sql.contains("password"));
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn update_skips_pk_and_binds_id_last() {
        let changes = json!({"id": "b", "title": "new"}).as_object().cloned().unwrap();
        let q = update(&post(), &json!("a"), &changes).unwrap();
        assert!(q.sql.starts_with("UPDATE \"post\" SET \"title\" = $1::text WHERE \"id\" = $2::text"));
        assert_eq!(q.params, vec![json!("new"), json!("a")]);
    }

    #[test]
    fn unknown_filter_column_is_rejected() {
        let query = ListQuery::filtered(vec![Filter::Eq("password".into(), json!("x"))]);
        assert!(matches!(select_list(&post(), &query), Err(AppError::BadRequest(_))));
    }
}
