//! Data sources: the backing stores resources are read from and written to.

mod memory;
mod postgres;

pub use memory::MemoryDataSource;
pub use postgres::{ensure_database_exists, PgDataSource};

use crate::config::ResourceConfig;
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One row, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Substring match on the column's text value.
    Like(String, String),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::Like(c, _) | Filter::In(c, _) => c,
        }
    }

    /// In-memory evaluation with the same semantics as the SQL rendering.
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq(_, expected) => value_eq(value, expected),
            Filter::Like(_, needle) => match value {
                Value::Null => false,
                Value::String(s) => s.contains(needle.as_str()),
                other => other.to_string().contains(needle.as_str()),
            },
            Filter::In(_, candidates) => candidates.iter().any(|c| value_eq(value, c)),
        }
    }
}

/// Equality that treats numbers by value.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(column: &str) -> Self {
        Sort {
            column: column.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Sort {
            column: column.to_string(),
            direction: SortDirection::Desc,
        }
    }

    /// `createdAt` ascending, `-createdAt` descending.
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(col) => Sort::desc(col),
            None => Sort::asc(s),
        }
    }
}

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub sort: Vec<Sort>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn filtered(filters: Vec<Filter>) -> Self {
        ListQuery {
            filters,
            ..Default::default()
        }
    }

    /// Limit with default and ceiling applied.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// A backing store. Implementations only ever touch persisted columns of the given resource.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list(&self, resource: &ResourceConfig, query: &ListQuery) -> Result<Vec<Record>, AppError>;

    async fn get(&self, resource: &ResourceConfig, id: &Value) -> Result<Option<Record>, AppError>;

    /// Insert and return the stored row.
    async fn insert(&self, resource: &ResourceConfig, record: &Record) -> Result<Record, AppError>;

    /// Apply changes to one row; `None` when the row does not exist.
    async fn update(&self, resource: &ResourceConfig, id: &Value, changes: &Record) -> Result<Option<Record>, AppError>;

    /// Delete one row; returns whether it existed.
    async fn delete(&self, resource: &ResourceConfig, id: &Value) -> Result<bool, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Data sources by id, as referenced from `ResourceConfig::data_source`.
#[derive(Clone, Default)]
pub struct DataSources {
    by_id: HashMap<String, Arc<dyn DataSource>>,
}

impl DataSources {
    pub fn insert(&mut self, id: &str, source: Arc<dyn DataSource>) {
        self.by_id.insert(id.to_string(), source);
    }

    pub fn with(mut self, id: &str, source: Arc<dyn DataSource>) -> Self {
        self.insert(id, source);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn DataSource>> {
        self.by_id.get(id)
    }

    pub fn for_resource(&self, resource: &ResourceConfig) -> Result<&Arc<dyn DataSource>, AppError> {
        self.get(&resource.data_source).ok_or_else(|| {
            AppError::Config(crate::error::ConfigError::MissingReference {
                kind: "data source",
                id: resource.data_source.clone(),
                from: format!("resource {}", resource.id),
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn DataSource>)> {
        self.by_id.iter()
    }
}
