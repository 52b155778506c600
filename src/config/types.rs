//! Resource and column descriptors.

use crate::auth::AdminUser;
use crate::config::plugins::{PluginConfig, UploadPlugin};
use crate::error::ConfigError;
use crate::hooks::ResourceHooks;
use crate::store::Record;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Write action a hook chain or a `required` rule is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Edit,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        })
    }
}

/// UI context a column can be shown in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowIn {
    List,
    Create,
    Edit,
    Filter,
    Show,
}

impl ShowIn {
    pub const ALL: [ShowIn; 5] = [ShowIn::List, ShowIn::Create, ShowIn::Edit, ShowIn::Filter, ShowIn::Show];

    /// Context that supplies values for a write action.
    pub fn for_action(action: Action) -> Option<ShowIn> {
        match action {
            Action::Create => Some(ShowIn::Create),
            Action::Edit => Some(ShowIn::Edit),
            Action::Delete => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    String,
    Text,
    RichText,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Json,
}

impl DataType {
    /// PostgreSQL column type used for DDL and parameter casts.
    pub fn pg_type(self) -> &'static str {
        match self {
            DataType::String | DataType::Text | DataType::RichText => "text",
            DataType::Integer => "bigint",
            DataType::Float => "double precision",
            DataType::Decimal => "numeric",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::DateTime => "timestamptz",
            DataType::Time => "time",
            DataType::Json => "jsonb",
        }
    }

    pub fn is_textual(self) -> bool {
        matches!(self, DataType::String | DataType::Text | DataType::RichText)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Required {
    Never,
    Always,
    OnCreate,
    OnEdit,
}

impl Required {
    pub fn applies_to(self, action: Action) -> bool {
        match (self, action) {
            (Required::Always, Action::Create | Action::Edit) => true,
            (Required::OnCreate, Action::Create) => true,
            (Required::OnEdit, Action::Edit) => true,
            _ => false,
        }
    }
}

/// Value derived for a column when a record is created and the caller did not supply one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FillOnCreate {
    /// Random v4 UUID string.
    Uuid,
    /// Current UTC time, RFC 3339.
    Now,
    /// Primary key of the acting admin user.
    ActorId,
}

impl FillOnCreate {
    pub fn evaluate(self, actor: &AdminUser, _record: &Record) -> Value {
        match self {
            FillOnCreate::Uuid => Value::String(uuid::Uuid::new_v4().to_string()),
            FillOnCreate::Now => Value::String(
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
            FillOnCreate::ActorId => actor.pk.clone(),
        }
    }
}

/// Regex check applied to string values. The pattern is compiled once, when declared.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnValidator {
    #[serde(rename = "regExp")]
    pub pattern: String,
    pub message: String,
    /// `None` when the pattern does not compile; startup validation rejects that.
    #[serde(skip)]
    compiled: Option<Regex>,
}

impl ColumnValidator {
    pub fn email() -> Self {
        Self::pattern(
            r"^[a-zA-Z0-9._+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$",
            "Email is not valid, must be in format example@test.com",
        )
    }

    pub fn pattern(pattern: &str, message: &str) -> Self {
        ColumnValidator {
            pattern: pattern.into(),
            message: message.into(),
            compiled: Regex::new(pattern).ok(),
        }
    }

    pub fn regex(&self) -> Option<&Regex> {
        self.compiled.as_ref()
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EditingNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub primary_key: bool,
    pub required: Required,
    pub unique: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(skip)]
    pub backend_only: bool,
    pub masked: bool,
    pub enforce_lower_case: bool,
    pub show_in: Vec<ShowIn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ColumnValidator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing_note: Option<EditingNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_on_create: Option<FillOnCreate>,
}

impl ColumnConfig {
    /// New optional column visible everywhere.
    pub fn new(name: &str, data_type: DataType) -> Self {
        ColumnConfig {
            name: name.to_string(),
            label: humanize(name),
            data_type,
            primary_key: false,
            required: Required::Never,
            unique: false,
            is_virtual: false,
            backend_only: false,
            masked: false,
            enforce_lower_case: false,
            show_in: ShowIn::ALL.to_vec(),
            foreign_resource: None,
            min_length: None,
            max_length: None,
            validators: Vec::new(),
            editing_note: None,
            fill_on_create: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn required(mut self, required: Required) -> Self {
        self.required = required;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn virtual_column(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn backend_only(mut self) -> Self {
        self.backend_only = true;
        self
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn enforce_lower_case(mut self) -> Self {
        self.enforce_lower_case = true;
        self
    }

    pub fn show_in(mut self, contexts: &[ShowIn]) -> Self {
        self.show_in = contexts.to_vec();
        self
    }

    pub fn foreign_resource(mut self, resource_id: &str) -> Self {
        self.foreign_resource = Some(resource_id.to_string());
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn validator(mut self, validator: ColumnValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn editing_note(mut self, note: EditingNote) -> Self {
        self.editing_note = Some(note);
        self
    }

    pub fn fill_on_create(mut self, fill: FillOnCreate) -> Self {
        self.fill_on_create = Some(fill);
        self
    }

    pub fn is_shown_in(&self, context: ShowIn) -> bool {
        !self.backend_only && self.show_in.contains(&context)
    }

    /// Stored in the backing table.
    pub fn is_persisted(&self) -> bool {
        !self.is_virtual
    }
}

/// Human label for a record: `<prefix> <column value>`.
#[derive(Clone, Debug, Serialize)]
pub struct RecordLabel {
    pub prefix: String,
    pub column: String,
}

impl RecordLabel {
    pub fn new(prefix: &str, column: &str) -> Self {
        RecordLabel {
            prefix: prefix.to_string(),
            column: column.to_string(),
        }
    }

    pub fn render(&self, record: &Record) -> String {
        let value = match record.get(&self.column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if self.prefix.is_empty() {
            value
        } else {
            format!("{} {}", self.prefix, value)
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResourceConfig {
    pub id: String,
    pub table: String,
    pub data_source: String,
    pub label: String,
    pub record_label: RecordLabel,
    pub columns: Vec<ColumnConfig>,
    pub hooks: ResourceHooks,
    pub plugins: Vec<PluginConfig>,
}

/// Presentation-layer description of a resource. Backend-only columns are left out.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta<'a> {
    pub resource_id: &'a str,
    pub table: &'a str,
    pub label: &'a str,
    pub primary_key: Option<&'a str>,
    pub columns: Vec<&'a ColumnConfig>,
    pub plugins: &'a [PluginConfig],
    pub hooks: HookSummary,
}

#[derive(Clone, Debug, Serialize)]
pub struct HookSummary {
    pub create: Vec<String>,
    pub edit: Vec<String>,
    pub delete: Vec<String>,
}

impl ResourceConfig {
    pub fn new(id: &str, table: &str, data_source: &str, label: &str, record_label: RecordLabel) -> Self {
        ResourceConfig {
            id: id.to_string(),
            table: table.to_string(),
            data_source: data_source.to_string(),
            label: label.to_string(),
            record_label,
            columns: Vec::new(),
            hooks: ResourceHooks::default(),
            plugins: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The single primary-key column. Guaranteed present once the panel has been validated.
    pub fn primary_key(&self) -> Result<&ColumnConfig, ConfigError> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .ok_or_else(|| ConfigError::MissingPrimaryKey {
                resource: self.id.clone(),
            })
    }

    pub fn persisted_columns(&self) -> impl Iterator<Item = &ColumnConfig> {
        self.columns.iter().filter(|c| c.is_persisted())
    }

    pub fn upload_plugin(&self, column: &str) -> Option<&UploadPlugin> {
        self.plugins.iter().find_map(|p| match p {
            PluginConfig::Upload(u) if u.path_column == column => Some(u),
            _ => None,
        })
    }

    pub fn meta(&self) -> ResourceMeta<'_> {
        ResourceMeta {
            resource_id: &self.id,
            table: &self.table,
            label: &self.label,
            primary_key: self.primary_key().ok().map(|c| c.name.as_str()),
            columns: self.columns.iter().filter(|c| !c.backend_only).collect(),
            plugins: &self.plugins,
            hooks: HookSummary {
                create: self.hooks.create.names(),
                edit: self.hooks.edit.names(),
                delete: self.hooks.delete.names(),
            },
        }
    }

    /// Record as the presentation layer may see it: no virtual or backend-only values, plus `_label`.
    pub fn present(&self, mut record: Record) -> Record {
        for c in &self.columns {
            if c.is_virtual || c.backend_only {
                record.remove(&c.name);
            }
        }
        let label = self.record_label.render(&record);
        record.insert("_label".into(), Value::String(label));
        record
    }
}

/// "createdAt" -> "Created At", "post_id" -> "Post Id".
pub fn humanize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut start_word = true;
    for (i, c) in name.chars().enumerate() {
        if c == '_' || c == '-' {
            start_word = true;
            continue;
        }
        if c.is_uppercase() && i > 0 {
            start_word = true;
        }
        if start_word {
            if !out.is_empty() {
                out.push(' ');
            }
            out.extend(c.to_uppercase());
            start_word = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn humanize_splits_camel_and_snake_case() {
        assert_eq!(humanize("createdAt"), "Created At");
        assert_eq!(humanize("publicName"), "Public Name");
        assert_eq!(humanize("post_id"), "Post Id");
        assert_eq!(humanize("id"), "Id");
    }

    #[test]
    fn required_rules_per_action() {
        assert!(Required::Always.applies_to(Action::Edit));
        assert!(Required::OnCreate.applies_to(Action::Create));
        assert!(!Required::OnCreate.applies_to(Action::Edit));
        assert!(!Required::Always.applies_to(Action::Delete));
        assert!(!Required::Never.applies_to(Action::Create));
    }

    #[test]
    fn present_strips_virtual_and_backend_only_and_labels() {
        let mut resource = ResourceConfig::new("user", "user", "maindb", "Users", RecordLabel::new("👤", "email"));
        resource.columns = vec![
            ColumnConfig::new("id", DataType::String).primary_key(),
            ColumnConfig::new("email", DataType::String),
            ColumnConfig::new("password", DataType::String).virtual_column(),
            ColumnConfig::new("passwordHash", DataType::String).backend_only().show_in(&[]),
        ];
        let record = json!({"id": "1", "email": "a@b.co", "password": "x", "passwordHash": "h"});
        let out = resource.present(record.as_object().cloned().unwrap());
        assert_eq!(out.get("_label"), Some(&json!("👤 a@b.co")));
        assert!(!out.contains_key("password"));
        assert!(!out.contains_key("passwordHash"));

        let meta = serde_json::to_value(resource.meta()).unwrap();
        let names: Vec<&str> = meta["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["id", "email", "password"]);
        assert_eq!(meta["primaryKey"], "id");
    }

    #[test]
    fn validator_pattern_is_compiled_when_declared() {
        let email = ColumnValidator::email();
        let re = email.regex().unwrap();
        assert!(re.is_match("writer@example.com"));
        assert!(!re.is_match("nope"));
        assert!(ColumnValidator::pattern("([a-z", "bad").regex().is_none());

        let meta = serde_json::to_value(&email).unwrap();
        assert_eq!(meta["regExp"], email.pattern);
        assert!(meta.get("compiled").is_none());
    }

    #[test]
    fn backend_only_column_is_never_shown() {
        let c = ColumnConfig::new("secret", DataType::String).backend_only();
        assert!(ShowIn::ALL.iter().all(|ctx| !c.is_shown_in(*ctx)));
    }
}
