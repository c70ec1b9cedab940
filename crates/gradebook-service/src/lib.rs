//! gradebook-service: Request handling around the gradebook core.
//!
//! Loads configuration, authenticates callers against a static user table,
//! serializes requests through a single lock, maps failures to statuses and
//! replays TOML request scripts.

pub mod config;
pub mod error;
pub mod identity;
pub mod report;
pub mod request;
pub mod script;
pub mod service;

pub use config::{load_config, GradebookConfig, UserConfig};
pub use error::{status_code, ErrorResponse};
pub use identity::StaticIdentityStore;
pub use request::{Request, Response};
pub use service::{GradebookService, Reply};
