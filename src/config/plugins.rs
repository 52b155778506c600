//! Typed plugin attachments. Each plugin's configuration is validated at startup and handed
//! unchanged to the external capability; credentials are never serialised.

use crate::error::{ConfigError, PluginError};
use chrono::Datelike;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webm", "webp"];

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PluginConfig {
    Upload(UploadPlugin),
    RichEditor(RichEditorPlugin),
    FieldCompletion(FieldCompletionPlugin),
}

impl PluginConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            PluginConfig::Upload(_) => "upload",
            PluginConfig::RichEditor(_) => "richEditor",
            PluginConfig::FieldCompletion(_) => "fieldCompletion",
        }
    }

    /// Column the plugin populates.
    pub fn target_column(&self) -> &str {
        match self {
            PluginConfig::Upload(p) => &p.path_column,
            PluginConfig::RichEditor(p) => &p.html_column,
            PluginConfig::FieldCompletion(p) => &p.column,
        }
    }

    pub fn rate_limits(&self) -> Vec<&RateLimitPolicy> {
        match self {
            PluginConfig::Upload(p) => p
                .generation
                .as_ref()
                .and_then(|g| g.rate_limit.as_ref())
                .into_iter()
                .collect(),
            PluginConfig::RichEditor(p) => p
                .completion
                .as_ref()
                .and_then(|c| c.rate_limit.as_ref())
                .into_iter()
                .collect(),
            PluginConfig::FieldCompletion(p) => p.completion.rate_limit.iter().collect(),
        }
    }
}

/// Object storage coordinates.
#[derive(Clone, Debug, Serialize)]
pub struct S3Location {
    pub bucket: String,
    pub region: String,
}

impl S3Location {
    pub fn new(bucket: &str, region: &str) -> Self {
        S3Location {
            bucket: bucket.to_string(),
            region: region.to_string(),
        }
    }

    /// Public virtual-hosted URL of an object key.
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket,
            self.region,
            key.trim_start_matches('/')
        )
    }
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "***"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPlugin {
    pub path_column: String,
    pub storage: S3Location,
    #[serde(skip)]
    pub credentials: Credentials,
    pub allowed_extensions: Vec<String>,
    pub max_file_size: u64,
    pub acl: String,
    pub path_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<ImageGeneration>,
}

impl UploadPlugin {
    pub fn new(path_column: &str, storage: S3Location, credentials: Credentials, path_prefix: &str) -> Self {
        UploadPlugin {
            path_column: path_column.to_string(),
            storage,
            credentials,
            allowed_extensions: IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            acl: "public-read".into(),
            path_prefix: path_prefix.to_string(),
            generation: None,
        }
    }

    pub fn with_generation(mut self, generation: ImageGeneration) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Check a candidate file against the extension allow-list and size ceiling.
    pub fn check_file(&self, extension: &str, size: u64) -> Result<String, PluginError> {
        let ext = extension.trim_start_matches('.').to_lowercase();
        if !self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
            return Err(PluginError::ExtensionNotAllowed {
                extension: ext,
                allowed: self.allowed_extensions.join(", "),
            });
        }
        if size > self.max_file_size {
            return Err(PluginError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(ext)
    }

    /// Storage key for a new upload: `<prefix>/<year>/<uuid>/<name>.<ext>`.
    pub fn storage_path(&self, original_filename: &str, extension: &str, size: u64) -> Result<String, PluginError> {
        self.storage_path_at(
            chrono::Utc::now().year(),
            uuid::Uuid::new_v4(),
            original_filename,
            extension,
            size,
        )
    }

    pub fn storage_path_at(
        &self,
        year: i32,
        id: uuid::Uuid,
        original_filename: &str,
        extension: &str,
        size: u64,
    ) -> Result<String, PluginError> {
        let ext = self.check_file(extension, size)?;
        let name = original_filename.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(PluginError::InvalidFileName(original_filename.to_string()));
        }
        Ok(format!(
            "{}/{}/{}/{}.{}",
            self.path_prefix.trim_matches('/'),
            year,
            id,
            name,
            ext
        ))
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGeneration {
    pub provider: String,
    pub count_to_generate: u32,
    pub model: String,
    pub size: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub fields_for_context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitPolicy>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    pub provider: String,
    pub model: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub debounce_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitPolicy>,
}

impl CompletionConfig {
    pub fn openai_chat(model: &str, api_key: Option<String>) -> Self {
        CompletionConfig {
            provider: "openai-chat-gpt".into(),
            model: model.to_string(),
            api_key,
            debounce_ms: 250,
            rate_limit: None,
        }
    }

    pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = Some(policy);
        self
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RichEditorPlugin {
    pub html_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<AttachmentConfig>,
}

/// Where the rich editor stores embedded images.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentConfig {
    pub resource_id: String,
    pub column: String,
    pub record_id_column: String,
    pub resource_id_column: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCompletionPlugin {
    pub column: String,
    pub completion: CompletionConfig,
}

/// Rate-limit policy as written in configuration, e.g. `5/2d`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    pub limit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RateLimitPolicy {
    pub fn new(limit: &str) -> Self {
        RateLimitPolicy {
            limit: limit.to_string(),
            error_message: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }

    pub fn parse(&self) -> Result<RateLimit, ConfigError> {
        RateLimit::parse(&self.limit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    pub count: u32,
    pub window: Duration,
}

impl RateLimit {
    /// Parse `<count>/<n><unit>` where unit is one of `s`, `m`, `h`, `d`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let err = || ConfigError::RateLimit(s.to_string());
        let (count, window) = s.trim().split_once('/').ok_or_else(err)?;
        let count: u32 = count.trim().parse().map_err(|_| err())?;
        let window = window.trim();
        let unit = window.chars().last().ok_or_else(err)?;
        let amount: u64 = window[..window.len() - unit.len_utf8()].parse().map_err(|_| err())?;
        let seconds = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            _ => return Err(err()),
        };
        if count == 0 || amount == 0 {
            return Err(err());
        }
        Ok(RateLimit {
            count,
            window: Duration::from_secs(amount * seconds),
        })
    }
}
