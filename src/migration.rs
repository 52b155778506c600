//! Create the backing tables for every resource of a data source.
//! Tables are created if missing; foreign keys are added best-effort afterwards so order does not matter.

use crate::config::{AdminPanel, ResourceConfig};
use crate::error::AppError;
use crate::sql::quoted;
use sqlx::PgPool;

/// `CREATE TABLE IF NOT EXISTS` for the persisted columns of one resource.
pub fn create_table_sql(resource: &ResourceConfig) -> Result<String, AppError> {
    let pk = resource.primary_key()?;
    let mut defs: Vec<String> = Vec::new();
    for c in resource.persisted_columns() {
        let mut def = format!("{} {}", quoted(&c.name), c.data_type.pg_type());
        if c.required == crate::config::Required::Always || c.primary_key {
            def.push_str(" NOT NULL");
        }
        defs.push(def);
    }
    defs.push(format!("PRIMARY KEY ({})", quoted(&pk.name)));
    for c in resource.persisted_columns().filter(|c| c.unique && !c.primary_key) {
        defs.push(format!("UNIQUE ({})", quoted(&c.name)));
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quoted(&resource.table),
        defs.join(",\n    ")
    ))
}

/// `ALTER TABLE .. ADD CONSTRAINT` for each foreign-resource column.
pub fn foreign_key_sql(panel: &AdminPanel, resource: &ResourceConfig) -> Vec<String> {
    resource
        .persisted_columns()
        .filter_map(|c| {
            let target = panel.resource(c.foreign_resource.as_deref()?)?;
            let target_pk = target.primary_key().ok()?;
            Some(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE SET NULL",
                quoted(&resource.table),
                quoted(&format!("fk_{}_{}", resource.table, c.name)),
                quoted(&c.name),
                quoted(&target.table),
                quoted(&target_pk.name)
            ))
        })
        .collect()
}

/// Ensure tables for the resources bound to `data_source_id`. Idempotent.
pub async fn ensure_tables(pool: &PgPool, panel: &AdminPanel, data_source_id: &str) -> Result<(), AppError> {
    let resources: Vec<&ResourceConfig> = panel
        .resources
        .iter()
        .filter(|r| r.data_source == data_source_id)
        .collect();

    for r in &resources {
        let ddl = create_table_sql(r)?;
        tracing::debug!(table = %r.table, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
    }

    // Constraint may already exist from a previous start.
    for r in &resources {
        for ddl in foreign_key_sql(panel, r) {
            if let Err(e) = sqlx::query(&ddl).execute(pool).await {
                tracing::warn!(table = %r.table, error = %e, "foreign key not added");
            }
        }
    }
    tracing::info!(data_source = %data_source_id, tables = resources.len(), "tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, DataType, RecordLabel, Required};

    fn users() -> ResourceConfig {
        let mut r = ResourceConfig::new("user", "user", "maindb", "Users", RecordLabel::new("", "email"));
        r.columns = vec![
            ColumnConfig::new("id", DataType::String).primary_key(),
            ColumnConfig::new("email", DataType::String).required(Required::Always).unique(),
            ColumnConfig::new("createdAt", DataType::DateTime),
            ColumnConfig::new("password", DataType::String).virtual_column(),
        ];
        r
    }

    #[test]
    fn ddl_covers_persisted_columns_and_constraints() {
        let ddl = create_table_sql(&users()).unwrap();
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS \"user\" (\n    \
             \"id\" text NOT NULL,\n    \
             \"email\" text NOT NULL,\n    \
             \"createdAt\" timestamptz,\n    \
             PRIMARY KEY (\"id\"),\n    \
             UNIQUE (\"email\")\n)"
        );
    }
}
