//! The admin panel: every resource plus auth, branding and menu. Built once at startup and
//! passed by reference; nothing here is global.

use crate::config::types::ResourceConfig;
use crate::config::validator::validate;
use crate::error::ConfigError;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct DataSourceConfig {
    pub id: String,
    #[serde(skip)]
    pub url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    pub users_resource_id: String,
    pub username_column: String,
    pub password_hash_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_credentials: Option<DemoCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_prompt_html: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SidebarColors {
    pub main: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Announcement {
    pub html: String,
    pub closable: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    pub brand_name: String,
    pub dates_format: String,
    pub time_format: String,
    pub empty_field_placeholder: String,
    pub primary_color: String,
    pub sidebar: SidebarColors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<Announcement>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MenuItem {
    #[serde(rename_all = "camelCase")]
    Resource {
        label: String,
        icon: String,
        resource_id: String,
        homepage: bool,
    },
    Gap,
    Divider,
    Heading {
        label: String,
    },
}

#[derive(Clone, Debug)]
pub struct AdminPanel {
    pub base_url: String,
    pub auth: AuthConfig,
    pub customization: Customization,
    pub data_sources: Vec<DataSourceConfig>,
    pub resources: Vec<ResourceConfig>,
    pub menu: Vec<MenuItem>,
}

/// What an unauthenticated client (the login page) may learn about the panel.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPanelConfig<'a> {
    pub base_url: &'a str,
    pub brand_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_prompt_html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_credentials: Option<&'a DemoCredentials>,
    pub customization: &'a Customization,
    pub menu: &'a [MenuItem],
}

impl AdminPanel {
    /// Assemble and validate. A panel that fails validation is never returned.
    pub fn new(
        base_url: &str,
        auth: AuthConfig,
        customization: Customization,
        data_sources: Vec<DataSourceConfig>,
        resources: Vec<ResourceConfig>,
        menu: Vec<MenuItem>,
    ) -> Result<Self, ConfigError> {
        let panel = AdminPanel {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            customization,
            data_sources,
            resources,
            menu,
        };
        validate(&panel)?;
        tracing::debug!(
            resources = panel.resources.len(),
            data_sources = panel.data_sources.len(),
            "admin panel configuration validated"
        );
        Ok(panel)
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn users_resource(&self) -> Option<&ResourceConfig> {
        self.resource(&self.auth.users_resource_id)
    }

    pub fn public_config(&self) -> PublicPanelConfig<'_> {
        PublicPanelConfig {
            base_url: &self.base_url,
            brand_name: &self.customization.brand_name,
            login_prompt_html: self.auth.login_prompt_html.as_deref(),
            demo_credentials: self.auth.demo_credentials.as_ref(),
            customization: &self.customization,
            menu: &self.menu,
        }
    }
}
