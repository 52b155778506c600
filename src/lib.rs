//! Blog back-office: declarative admin resources over PostgreSQL, before-save hooks,
//! a public posts API and a pass-through proxy to the front-end.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod hooks;
pub mod migration;
pub mod resources;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AdminPanel, ResourceConfig};
pub use error::{AppError, ConfigError, PluginError};
pub use migration::ensure_tables;
pub use response::{success_many, success_one};
pub use routes::app_router;
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_database_exists, DataSource, DataSources, MemoryDataSource, PgDataSource, Record};
