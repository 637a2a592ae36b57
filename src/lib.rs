//! Client library for the Menuum meal-planning service: credential storage,
//! single-flight token refresh, authenticated dispatch and the REST API.

pub mod api;
pub mod auth;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod expiry;
pub mod model;
pub mod refresh;
pub mod store;

pub use self::client::MenuumClient;
