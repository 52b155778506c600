//! In-process data source with the same filter and sort semantics as the Postgres one.

use crate::config::ResourceConfig;
use crate::error::AppError;
use crate::sql::persisted_column;
use crate::store::{value_eq, DataSource, ListQuery, Record, SortDirection};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tables keyed by table name; rows kept in insertion order.
#[derive(Default)]
pub struct MemoryDataSource {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows as-is, bypassing any pipeline. Used to seed fixtures.
    pub fn seed(&self, table: &str, rows: Vec<Record>) {
        self.write().entry(table.to_string()).or_default().extend(rows);
    }

    /// Snapshot of a table.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.read().get(table).cloned().unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Record>>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Record>>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn pk_name(resource: &ResourceConfig) -> Result<&str, AppError> {
    Ok(resource.primary_key()?.name.as_str())
}

/// Keep only persisted columns of the resource.
fn persisted(resource: &ResourceConfig, record: &Record) -> Record {
    resource
        .persisted_columns()
        .filter_map(|c| record.get(&c.name).map(|v| (c.name.clone(), v.clone())))
        .collect()
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn list(&self, resource: &ResourceConfig, query: &ListQuery) -> Result<Vec<Record>, AppError> {
        let filtered = query.filters.iter().map(|f| f.column());
        let sorted = query.sort.iter().map(|s| s.column.as_str());
        for column in filtered.chain(sorted) {
            persisted_column(resource, column)?;
        }
        let tables = self.read();
        let mut rows: Vec<Record> = tables
            .get(&resource.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filters.iter().all(|f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        let pk = pk_name(resource)?.to_string();
        let sorts = if query.sort.is_empty() {
            vec![crate::store::Sort::asc(&pk)]
        } else {
            query.sort.clone()
        };
        rows.sort_by(|a, b| {
            for s in &sorts {
                let va = a.get(&s.column).unwrap_or(&Value::Null);
                let vb = b.get(&s.column).unwrap_or(&Value::Null);
                let ord = match s.direction {
                    SortDirection::Asc => compare_values(va, vb),
                    SortDirection::Desc => compare_values(vb, va),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(rows
            .into_iter()
            .skip(query.effective_offset() as usize)
            .take(query.effective_limit() as usize)
            .collect())
    }

    async fn get(&self, resource: &ResourceConfig, id: &Value) -> Result<Option<Record>, AppError> {
        let pk = pk_name(resource)?;
        let tables = self.read();
        Ok(tables
            .get(&resource.table)
            .and_then(|rows| rows.iter().find(|r| value_eq(r.get(pk).unwrap_or(&Value::Null), id)))
            .cloned())
    }

    async fn insert(&self, resource: &ResourceConfig, record: &Record) -> Result<Record, AppError> {
        let pk = pk_name(resource)?;
        let row = persisted(resource, record);
        let id = row.get(pk).cloned().unwrap_or(Value::Null);
        let mut tables = self.write();
        let rows = tables.entry(resource.table.clone()).or_default();
        if !id.is_null() && rows.iter().any(|r| value_eq(r.get(pk).unwrap_or(&Value::Null), &id)) {
            return Err(AppError::Conflict(format!("{} {} already exists", resource.id, id)));
        }
        for c in resource.persisted_columns().filter(|c| c.unique) {
            if let Some(v) = row.get(&c.name).filter(|v| !v.is_null()) {
                if rows.iter().any(|r| r.get(&c.name).map(|x| value_eq(x, v)).unwrap_or(false)) {
                    return Err(AppError::Conflict(format!("{} must be unique", c.name)));
                }
            }
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, resource: &ResourceConfig, id: &Value, changes: &Record) -> Result<Option<Record>, AppError> {
        let pk = pk_name(resource)?;
        let changes = persisted(resource, changes);
        let mut tables = self.write();
        let Some(rows) = tables.get_mut(&resource.table) else {
            return Ok(None);
        };
        let Some(row) = rows.iter_mut().find(|r| value_eq(r.get(pk).unwrap_or(&Value::Null), id)) else {
            return Ok(None);
        };
        for (k, v) in changes {
            if k != pk {
                row.insert(k, v);
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, resource: &ResourceConfig, id: &Value) -> Result<bool, AppError> {
        let pk = pk_name(resource)?;
        let mut tables = self.write();
        let Some(rows) = tables.get_mut(&resource.table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| !value_eq(r.get(pk).unwrap_or(&Value::Null), id));
        Ok(rows.len() != before)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
