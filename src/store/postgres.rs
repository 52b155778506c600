//! PostgreSQL data source. Every value is bound as text and cast to the column type.

use crate::config::{DataType, ResourceConfig};
use crate::error::AppError;
use crate::sql::{self, text_param, QueryBuf};
use crate::store::{DataSource, ListQuery, Record};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgDataSource {
    pool: PgPool,
}

impl PgDataSource {
    pub fn new(pool: PgPool) -> Self {
        PgDataSource { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_optional(&self, resource: &ResourceConfig, q: &QueryBuf) -> Result<Option<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(text_param(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| row_to_record(resource, &r)).transpose()
    }

    async fn fetch_all(&self, resource: &ResourceConfig, q: &QueryBuf) -> Result<Vec<Record>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(text_param(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_record(resource, r)).collect()
    }
}

#[async_trait]
impl DataSource for PgDataSource {
    async fn list(&self, resource: &ResourceConfig, query: &ListQuery) -> Result<Vec<Record>, AppError> {
        let q = sql::select_list(resource, query)?;
        self.fetch_all(resource, &q).await
    }

    async fn get(&self, resource: &ResourceConfig, id: &Value) -> Result<Option<Record>, AppError> {
        let q = sql::select_by_id(resource, id)?;
        self.fetch_optional(resource, &q).await
    }

    async fn insert(&self, resource: &ResourceConfig, record: &Record) -> Result<Record, AppError> {
        let q = sql::insert(resource, record);
        self.fetch_optional(resource, &q)
            .await
            .map_err(unique_violation_to_conflict)?
            .ok_or_else(|| AppError::BadRequest(format!("insert into {} returned no row", resource.table)))
    }

    async fn update(&self, resource: &ResourceConfig, id: &Value, changes: &Record) -> Result<Option<Record>, AppError> {
        let q = sql::update(resource, id, changes)?;
        self.fetch_optional(resource, &q)
            .await
            .map_err(unique_violation_to_conflict)
    }

    async fn delete(&self, resource: &ResourceConfig, id: &Value) -> Result<bool, AppError> {
        let q = sql::delete(resource, id)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(text_param(p));
        }
        Ok(query.fetch_optional(&self.pool).await?.is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Races past the pre-write uniqueness check still come back as 409.
fn unique_violation_to_conflict(e: AppError) -> AppError {
    match e {
        AppError::Db(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
            AppError::Conflict(db.message().to_string())
        }
        other => other,
    }
}

fn row_to_record(resource: &ResourceConfig, row: &PgRow) -> Result<Record, AppError> {
    let mut map = Record::new();
    for c in resource.persisted_columns() {
        map.insert(c.name.clone(), cell_to_value(row, &c.name, c.data_type)?);
    }
    Ok(map)
}

fn cell_to_value(row: &PgRow, name: &str, data_type: DataType) -> Result<Value, AppError> {
    let v = match data_type {
        DataType::String | DataType::Text | DataType::RichText | DataType::Decimal | DataType::Time => row
            .try_get::<Option<String>, _>(name)?
            .map(Value::String),
        DataType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
        DataType::Float => row
            .try_get::<Option<f64>, _>(name)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        DataType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        DataType::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(name)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        DataType::DateTime => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))),
        DataType::Json => row.try_get::<Option<Value>, _>(name)?,
    };
    Ok(v.unwrap_or(Value::Null))
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await.map_err(AppError::Db)?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(AppError::Db)?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(AppError::Db)?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}
