//! evflow Client - REST bindings for event flows and flow templates
//!
//! All ids placed in request paths are checked to be UUIDs before a request
//! is built; see [`ids::require_uuid`].

pub mod client;
pub mod config;
pub mod error;
pub mod ids;

pub use client::FlowApiClient;
pub use config::{ClientConfig, ENV_API_TIMEOUT, ENV_API_TOKEN, ENV_API_URL};
pub use error::{ApiError, ApiResult};
pub use ids::{require_uuid, ChildKind, FlowScope};
