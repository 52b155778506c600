//! Resource configuration model: resources, columns, plugins and the panel that owns them.

pub mod panel;
pub mod plugins;
pub mod types;
pub mod validator;

pub use panel::*;
pub use plugins::*;
pub use types::*;
pub use validator::validate;
