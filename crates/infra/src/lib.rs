//! Infrastructure layer: stores, outbound HTTP clients, config and the
//! application services built on them.

pub mod config;
pub mod error;
pub mod lookup;
pub mod notify;
pub mod services;
pub mod store;


pub use config::{AppConfig, ConfigError, NotifySettings};
pub use error::ServiceError;
