//! Shared application state for all routes. Configuration is immutable after startup.

use crate::config::{AdminPanel, ResourceConfig};
use crate::error::{AppError, ConfigError};
use crate::settings::Settings;
use crate::store::{DataSource, DataSources};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub panel: Arc<AdminPanel>,
    pub data_sources: DataSources,
    pub settings: Arc<Settings>,
    /// Upstream client for the front-end proxy. Redirects are relayed, not followed.
    pub http: reqwest::Client,
}

impl AppState {
    /// Every data source the panel declares must be registered.
    pub fn new(panel: AdminPanel, data_sources: DataSources, settings: Settings) -> Result<Self, ConfigError> {
        for ds in &panel.data_sources {
            if data_sources.get(&ds.id).is_none() {
                return Err(ConfigError::MissingReference {
                    kind: "data source",
                    id: ds.id.clone(),
                    from: "application state".into(),
                });
            }
        }
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::Validation(format!("http client: {}", e)))?;
        Ok(AppState {
            panel: Arc::new(panel),
            data_sources,
            settings: Arc::new(settings),
            http,
        })
    }

    pub fn resource(&self, id: &str) -> Result<&ResourceConfig, AppError> {
        self.panel
            .resource(id)
            .ok_or_else(|| AppError::NotFound(format!("resource {}", id)))
    }

    pub fn store_for(&self, resource: &ResourceConfig) -> Result<&Arc<dyn DataSource>, AppError> {
        self.data_sources.for_resource(resource)
    }
}
