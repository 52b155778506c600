//! Record validation from column rules.

use crate::config::{Action, ColumnConfig, DataType, ResourceConfig};
use crate::error::AppError;
use crate::store::Record;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a full record. Every column required for `action` must carry a non-empty value.
    pub fn validate(resource: &ResourceConfig, record: &Record, action: Action) -> Result<(), AppError> {
        for c in &resource.columns {
            let val = record.get(&c.name);
            if c.required.applies_to(action) && is_blank(val) {
                return Err(AppError::Validation(format!("{} is required", c.label)));
            }
            if let Some(v) = val {
                validate_field(c, v)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present (for PATCH). A required field may not be cleared.
    pub fn validate_partial(resource: &ResourceConfig, changes: &Record, action: Action) -> Result<(), AppError> {
        for (name, v) in changes {
            let Some(c) = resource.column(name) else { continue };
            if c.required.applies_to(action) && is_blank(Some(v)) {
                return Err(AppError::Validation(format!("{} is required", c.label)));
            }
            validate_field(c, v)?;
        }
        Ok(())
    }
}

fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn validate_field(c: &ColumnConfig, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    validate_type(c, v)?;
    let Some(s) = v.as_str() else { return Ok(()) };
    let len = s.chars().count();
    if let Some(max) = c.max_length {
        if len > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                c.label, max
            )));
        }
    }
    if let Some(min) = c.min_length {
        if len < min {
            return Err(AppError::Validation(format!(
                "{} must be at least {} characters",
                c.label, min
            )));
        }
    }
    for validator in &c.validators {
        let re = validator
            .regex()
            .ok_or_else(|| AppError::Validation(format!("invalid pattern for {}", c.label)))?;
        if !re.is_match(s) {
            return Err(AppError::Validation(validator.message.clone()));
        }
    }
    Ok(())
}

fn validate_type(c: &ColumnConfig, v: &Value) -> Result<(), AppError> {
    let ok = match c.data_type {
        DataType::String | DataType::Text | DataType::RichText => v.is_string(),
        DataType::Integer => v.is_i64() || v.is_u64(),
        DataType::Float => v.is_number(),
        DataType::Decimal => v.is_number() || v.as_str().map(|s| s.parse::<f64>().is_ok()).unwrap_or(false),
        DataType::Boolean => v.is_boolean(),
        DataType::Date => v
            .as_str()
            .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
            .unwrap_or(false),
        DataType::DateTime => v
            .as_str()
            .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
            .unwrap_or(false),
        DataType::Time => v
            .as_str()
            .map(|s| {
                chrono::NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
                    || chrono::NaiveTime::parse_from_str(s, "%H:%M").is_ok()
            })
            .unwrap_or(false),
        DataType::Json => true,
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{} has an invalid value", c.label)))
    }
}
