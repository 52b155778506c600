//! Admin record operations: list/read plus the create, edit and delete write pipelines.

use crate::auth::AdminUser;
use crate::config::{Action, ColumnConfig, DataType, ResourceConfig, ShowIn};
use crate::error::AppError;
use crate::hooks::HookContext;
use crate::service::RequestValidator;
use crate::store::{DataSource, Filter, ListQuery, Record, Sort};
use serde_json::Value;
use std::collections::HashMap;

const RESERVED_PARAMS: &[&str] = &["limit", "offset", "sort"];

pub struct RecordService;

impl RecordService {
    /// List with `limit`, `offset`, `sort` and `<column>=<value>` equality filters.
    pub async fn list(
        resource: &ResourceConfig,
        store: &dyn DataSource,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Record>, AppError> {
        let query = list_query(resource, params)?;
        let rows = store.list(resource, &query).await?;
        Ok(rows.into_iter().map(|r| resource.present(r)).collect())
    }

    pub async fn read(resource: &ResourceConfig, store: &dyn DataSource, pk: &str) -> Result<Record, AppError> {
        let id = primary_key_value(resource, pk)?;
        let row = load(resource, store, &id).await?;
        Ok(resource.present(row))
    }

    pub async fn create(
        resource: &ResourceConfig,
        store: &dyn DataSource,
        actor: &AdminUser,
        input: Record,
    ) -> Result<Record, AppError> {
        let mut record = sanitize(resource, input, ShowIn::Create);
        for c in &resource.columns {
            let Some(fill) = c.fill_on_create else { continue };
            if record.get(&c.name).map(Value::is_null).unwrap_or(true) {
                let v = fill.evaluate(actor, &record);
                record.insert(c.name.clone(), v);
            }
        }
        enforce_lower_case(resource, &mut record);
        RequestValidator::validate(resource, &record, Action::Create)?;
        check_unique(resource, store, &record, None).await?;

        let ctx = HookContext {
            action: Action::Create,
            actor,
            resource,
            stored: None,
        };
        resource.hooks.create.run(&mut record, &ctx).await?;

        strip_virtual(resource, &mut record);
        let stored = store.insert(resource, &record).await?;
        tracing::info!(resource = %resource.id, actor = %actor.username, "record created");
        Ok(resource.present(stored))
    }

    pub async fn update(
        resource: &ResourceConfig,
        store: &dyn DataSource,
        actor: &AdminUser,
        pk: &str,
        input: Record,
    ) -> Result<Record, AppError> {
        let id = primary_key_value(resource, pk)?;
        let stored = load(resource, store, &id).await?;

        let mut changes = sanitize(resource, input, ShowIn::Edit);
        changes.retain(|name, v| {
            let is_virtual = resource.column(name).map(|c| c.is_virtual).unwrap_or(false);
            !(is_virtual && (v.is_null() || v.as_str() == Some("")))
        });
        enforce_lower_case(resource, &mut changes);
        RequestValidator::validate_partial(resource, &changes, Action::Edit)?;
        check_unique(resource, store, &changes, Some(&id)).await?;

        let ctx = HookContext {
            action: Action::Edit,
            actor,
            resource,
            stored: Some(&stored),
        };
        resource.hooks.edit.run(&mut changes, &ctx).await?;

        strip_virtual(resource, &mut changes);
        if changes.is_empty() {
            return Ok(resource.present(stored));
        }
        let updated = store
            .update(resource, &id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", resource.id, pk)))?;
        tracing::info!(resource = %resource.id, actor = %actor.username, record = %pk, "record updated");
        Ok(resource.present(updated))
    }

    /// Delete and return the record as it was.
    pub async fn delete(
        resource: &ResourceConfig,
        store: &dyn DataSource,
        actor: &AdminUser,
        pk: &str,
    ) -> Result<Record, AppError> {
        let id = primary_key_value(resource, pk)?;
        let stored = load(resource, store, &id).await?;

        let mut record = stored.clone();
        let ctx = HookContext {
            action: Action::Delete,
            actor,
            resource,
            stored: Some(&stored),
        };
        resource.hooks.delete.run(&mut record, &ctx).await?;

        if !store.delete(resource, &id).await? {
            return Err(AppError::NotFound(format!("{} {}", resource.id, pk)));
        }
        tracing::info!(resource = %resource.id, actor = %actor.username, record = %pk, "record deleted");
        Ok(resource.present(stored))
    }
}

async fn load(resource: &ResourceConfig, store: &dyn DataSource, id: &Value) -> Result<Record, AppError> {
    store
        .get(resource, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", resource.id, display(id))))
}

fn display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Keep only columns the caller may supply in `context`.
fn sanitize(resource: &ResourceConfig, input: Record, context: ShowIn) -> Record {
    input
        .into_iter()
        .filter(|(name, _)| {
            resource
                .column(name)
                .map(|c| c.is_shown_in(context))
                .unwrap_or(false)
        })
        .collect()
}

fn enforce_lower_case(resource: &ResourceConfig, record: &mut Record) {
    for c in resource.columns.iter().filter(|c| c.enforce_lower_case) {
        if let Some(Value::String(s)) = record.get_mut(&c.name) {
            *s = s.to_lowercase();
        }
    }
}

fn strip_virtual(resource: &ResourceConfig, record: &mut Record) {
    for c in resource.columns.iter().filter(|c| c.is_virtual) {
        record.remove(&c.name);
    }
}

/// 409 when another row already holds a value of a unique column.
async fn check_unique(
    resource: &ResourceConfig,
    store: &dyn DataSource,
    record: &Record,
    exclude: Option<&Value>,
) -> Result<(), AppError> {
    let pk = &resource.primary_key()?.name;
    for c in resource.persisted_columns().filter(|c| c.unique) {
        let Some(v) = record.get(&c.name).filter(|v| !v.is_null()) else { continue };
        let query = ListQuery {
            limit: Some(2),
            ..ListQuery::filtered(vec![Filter::Eq(c.name.clone(), v.clone())])
        };
        let clash = store.list(resource, &query).await?.into_iter().any(|row| match exclude {
            Some(id) => row.get(pk).map(|p| !crate::store::value_eq(p, id)).unwrap_or(true),
            None => true,
        });
        if clash {
            return Err(AppError::Conflict(format!("{} must be unique", c.label)));
        }
    }
    Ok(())
}

/// Parse a path or query string value according to the column type.
pub fn coerce(column: &ColumnConfig, raw: &str) -> Result<Value, AppError> {
    let invalid = || AppError::Validation(format!("{} has an invalid value", column.label));
    Ok(match column.data_type {
        DataType::Integer => Value::from(raw.parse::<i64>().map_err(|_| invalid())?),
        DataType::Float => serde_json::Number::from_f64(raw.parse::<f64>().map_err(|_| invalid())?)
            .map(Value::Number)
            .ok_or_else(invalid)?,
        DataType::Boolean => match raw {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        DataType::Json => serde_json::from_str(raw).map_err(|_| invalid())?,
        _ => Value::String(raw.to_string()),
    })
}

fn primary_key_value(resource: &ResourceConfig, raw: &str) -> Result<Value, AppError> {
    coerce(resource.primary_key()?, raw)
}

/// Build a store query from admin list parameters.
pub fn list_query(resource: &ResourceConfig, params: &HashMap<String, String>) -> Result<ListQuery, AppError> {
    let parse_u32 = |key: &str| -> Result<Option<u32>, AppError> {
        params
            .get(key)
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", key)))
            })
            .transpose()
    };
    let mut query = ListQuery {
        limit: parse_u32("limit")?,
        offset: parse_u32("offset")?,
        ..Default::default()
    };

    if let Some(sort) = params.get("sort").filter(|s| !s.is_empty()) {
        let sort = Sort::parse(sort);
        let visible = resource
            .column(&sort.column)
            .map(|c| c.is_persisted() && !c.backend_only)
            .unwrap_or(false);
        if !visible {
            return Err(AppError::BadRequest(format!("cannot sort by '{}'", sort.column)));
        }
        query.sort.push(sort);
    }

    let mut keys: Vec<&String> = params
        .keys()
        .filter(|k| !RESERVED_PARAMS.contains(&k.as_str()))
        .collect();
    keys.sort();
    for key in keys {
        let column = resource
            .column(key)
            .filter(|c| c.is_persisted() && c.is_shown_in(ShowIn::Filter))
            .ok_or_else(|| AppError::BadRequest(format!("cannot filter by '{}'", key)))?;
        query.filters.push(Filter::Eq(column.name.clone(), coerce(column, &params[key])?));
    }
    Ok(query)
}
