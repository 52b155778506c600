//! HTTP handlers for the admin API, the public posts API and the front-end proxy.

pub mod admin;
pub mod posts;
pub mod proxy;
pub use admin::*;
pub use posts::*;
pub use proxy::*;
