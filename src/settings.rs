//! Process settings read from the environment once at startup.

use crate::config::{Credentials, S3Location};
use crate::error::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/blog_admin";
pub const DEFAULT_APP_PORT: u16 = 3500;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Deployment mode from `NODE_ENV`. Only `development` is special.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
}

impl DeploymentMode {
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("development") => DeploymentMode::Development,
            _ => DeploymentMode::Production,
        }
    }

    /// Default tracing directive when `RUST_LOG` is unset.
    pub fn default_log_directive(self) -> &'static str {
        match self {
            DeploymentMode::Development => "blog_admin=debug",
            DeploymentMode::Production => "blog_admin=info",
        }
    }
}

#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub mode: DeploymentMode,
    pub app_port: u16,
    pub s3_bucket: String,
    pub s3_region: String,
    /// Credentials below are handed to plugin configuration untouched.
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub frontend_url: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("mode", &self.mode)
            .field("app_port", &self.app_port)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .field("frontend_url", &self.frontend_url)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Bucket and region every upload plugin and public URL is derived from.
    pub fn storage(&self) -> S3Location {
        S3Location::new(&self.s3_bucket, &self.s3_region)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let app_port = match get("APP_PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| ConfigError::Validation(format!("APP_PORT must be a port number, got '{}'", p)))?,
            None => DEFAULT_APP_PORT,
        };

        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            mode: DeploymentMode::from_node_env(get("NODE_ENV").as_deref()),
            app_port,
            s3_bucket: get("AWS_S3_BUCKET").ok_or(ConfigError::MissingEnv("AWS_S3_BUCKET"))?,
            s3_region: get("AWS_S3_REGION").ok_or(ConfigError::MissingEnv("AWS_S3_REGION"))?,
            aws_access_key_id: get("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            frontend_url: get("FRONTEND_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_unset() {
        let s = Settings::from_lookup(lookup(&[("AWS_S3_BUCKET", "b"), ("AWS_S3_REGION", "eu-central-1")])).unwrap();
        assert_eq!(s.app_port, 3500);
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.frontend_url, "http://localhost:3000");
        assert_eq!(s.mode, DeploymentMode::Production);
        assert!(s.openai_api_key.is_none());
    }

    #[test]
    fn missing_bucket_is_a_config_error() {
        let err = Settings::from_lookup(lookup(&[("AWS_S3_REGION", "us-east-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("AWS_S3_BUCKET")));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("AWS_S3_BUCKET", "b"),
            ("AWS_S3_REGION", "r"),
            ("APP_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn development_mode_and_trailing_slash() {
        let s = Settings::from_lookup(lookup(&[
            ("AWS_S3_BUCKET", "b"),
            ("AWS_S3_REGION", "r"),
            ("NODE_ENV", "development"),
            ("FRONTEND_URL", "http://127.0.0.1:4000/"),
        ]))
        .unwrap();
        assert_eq!(s.mode, DeploymentMode::Development);
        assert_eq!(s.mode.default_log_directive(), "blog_admin=debug");
        assert_eq!(s.frontend_url, "http://127.0.0.1:4000");
    }
}
