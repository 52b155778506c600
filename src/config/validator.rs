//! Startup validation: primary keys, references, supplyability of required columns, plugin
//! and auth consistency.

use crate::config::panel::{AdminPanel, MenuItem};
use crate::config::plugins::PluginConfig;
use crate::config::types::{Action, Required, ResourceConfig, ShowIn};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(panel: &AdminPanel) -> Result<(), ConfigError> {
    let data_source_ids: HashSet<&str> = panel.data_sources.iter().map(|d| d.id.as_str()).collect();
    let mut resource_ids = HashSet::new();
    for r in &panel.resources {
        if !resource_ids.insert(r.id.as_str()) {
            return Err(ConfigError::DuplicateResource(r.id.clone()));
        }
    }

    for r in &panel.resources {
        if !data_source_ids.contains(r.data_source.as_str()) {
            return Err(ConfigError::MissingReference {
                kind: "data source",
                id: r.data_source.clone(),
                from: format!("resource {}", r.id),
            });
        }
        validate_columns(r, &resource_ids)?;
        for plugin in &r.plugins {
            validate_plugin(panel, r, plugin)?;
        }
    }

    validate_auth(panel)?;
    validate_menu(panel, &resource_ids)?;
    Ok(())
}

fn validate_columns(r: &ResourceConfig, resource_ids: &HashSet<&str>) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for c in &r.columns {
        if !names.insert(c.name.as_str()) {
            return Err(ConfigError::DuplicateColumn {
                resource: r.id.clone(),
                column: c.name.clone(),
            });
        }
    }

    let pks: Vec<String> = r.columns.iter().filter(|c| c.primary_key).map(|c| c.name.clone()).collect();
    match pks.len() {
        0 => {
            return Err(ConfigError::MissingPrimaryKey {
                resource: r.id.clone(),
            })
        }
        1 => {}
        _ => {
            return Err(ConfigError::DuplicatePrimaryKey {
                resource: r.id.clone(),
                columns: pks,
            })
        }
    }

    for c in &r.columns {
        if c.primary_key && c.is_virtual {
            return Err(ConfigError::Validation(format!(
                "resource '{}': primary key '{}' cannot be virtual",
                r.id, c.name
            )));
        }
        if c.backend_only && !c.show_in.is_empty() {
            return Err(ConfigError::Validation(format!(
                "resource '{}': backend-only column '{}' cannot be shown in {:?}",
                r.id, c.name, c.show_in
            )));
        }
        if let Some(foreign) = &c.foreign_resource {
            if !resource_ids.contains(foreign.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "resource",
                    id: foreign.clone(),
                    from: format!("{}.{}", r.id, c.name),
                });
            }
        }
        let required_on_create = c.required.applies_to(Action::Create);
        if required_on_create && c.fill_on_create.is_none() && !c.is_shown_in(ShowIn::Create) {
            return Err(ConfigError::UnsuppliableRequired {
                resource: r.id.clone(),
                column: c.name.clone(),
            });
        }
        if c.required == Required::OnEdit && !c.is_shown_in(ShowIn::Edit) {
            return Err(ConfigError::UnsuppliableRequired {
                resource: r.id.clone(),
                column: c.name.clone(),
            });
        }
        if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
            if min > max {
                return Err(ConfigError::Validation(format!(
                    "resource '{}': column '{}' min length {} exceeds max length {}",
                    r.id, c.name, min, max
                )));
            }
        }
        for v in c.validators.iter().filter(|v| v.regex().is_none()) {
            let reason = regex::Regex::new(&v.pattern)
                .err()
                .map(|e| e.to_string())
                .unwrap_or_default();
            return Err(ConfigError::Validation(format!(
                "resource '{}': column '{}' has invalid pattern: {}",
                r.id, c.name, reason
            )));
        }
    }
    Ok(())
}

fn require_column(r: &ResourceConfig, column: &str, from: &str) -> Result<(), ConfigError> {
    if r.column(column).is_none() {
        return Err(ConfigError::MissingReference {
            kind: "column",
            id: format!("{}.{}", r.id, column),
            from: from.to_string(),
        });
    }
    Ok(())
}

fn validate_plugin(panel: &AdminPanel, r: &ResourceConfig, plugin: &PluginConfig) -> Result<(), ConfigError> {
    let from = format!("{} plugin on {}", plugin.kind(), r.id);
    require_column(r, plugin.target_column(), &from)?;
    for policy in plugin.rate_limits() {
        policy.parse()?;
    }
    match plugin {
        PluginConfig::Upload(p) => {
            if p.allowed_extensions.is_empty() {
                return Err(ConfigError::Validation(format!("{}: allowed extensions must not be empty", from)));
            }
            if p.max_file_size == 0 {
                return Err(ConfigError::Validation(format!("{}: max file size must be positive", from)));
            }
            if p.storage.bucket.trim().is_empty() || p.storage.region.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{}: storage bucket and region are required", from)));
            }
            if p.path_prefix.trim_matches('/').is_empty() {
                return Err(ConfigError::Validation(format!("{}: path prefix is required", from)));
            }
            if let Some(g) = &p.generation {
                if g.count_to_generate == 0 {
                    return Err(ConfigError::Validation(format!("{}: count to generate must be positive", from)));
                }
                for field in &g.fields_for_context {
                    require_column(r, field, &from)?;
                }
            }
        }
        PluginConfig::RichEditor(p) => {
            if let Some(a) = &p.attachments {
                let target = panel.resource(&a.resource_id).ok_or_else(|| ConfigError::MissingReference {
                    kind: "resource",
                    id: a.resource_id.clone(),
                    from: from.clone(),
                })?;
                for col in [&a.column, &a.record_id_column, &a.resource_id_column] {
                    require_column(target, col, &from)?;
                }
            }
        }
        PluginConfig::FieldCompletion(_) => {}
    }
    Ok(())
}

fn validate_auth(panel: &AdminPanel) -> Result<(), ConfigError> {
    let auth = &panel.auth;
    let users = panel.users_resource().ok_or_else(|| ConfigError::MissingReference {
        kind: "resource",
        id: auth.users_resource_id.clone(),
        from: "auth".into(),
    })?;
    require_column(users, &auth.username_column, "auth")?;
    let hash = users.column(&auth.password_hash_column).ok_or_else(|| ConfigError::MissingReference {
        kind: "column",
        id: format!("{}.{}", users.id, auth.password_hash_column),
        from: "auth".into(),
    })?;
    if !hash.backend_only {
        return Err(ConfigError::Validation(format!(
            "auth: password hash column '{}' must be backend-only",
            hash.name
        )));
    }
    Ok(())
}

fn validate_menu(panel: &AdminPanel, resource_ids: &HashSet<&str>) -> Result<(), ConfigError> {
    let mut homepages = 0;
    for item in &panel.menu {
        if let MenuItem::Resource { resource_id, homepage, .. } = item {
            if !resource_ids.contains(resource_id.as_str()) {
                return Err(ConfigError::MissingReference {
                    kind: "resource",
                    id: resource_id.clone(),
                    from: "menu".into(),
                });
            }
            if *homepage {
                homepages += 1;
            }
        }
    }
    if homepages > 1 {
        return Err(ConfigError::Validation("menu: more than one homepage item".into()));
    }
    Ok(())
}
