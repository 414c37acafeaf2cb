//! Stockwise core library.
//!
//! Shared API access and session handling for the inventory backend:
//! - `api`: the `ApiClient` (token attachment, timeout, envelope
//!   normalization, 401 teardown) and typed resource operations
//! - `auth`: session stores, navigation hand-off and role capability
//! - `config`: persisted configuration
//! - `models`: entities exchanged with the backend

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResult, ClientError};
pub use auth::{Navigator, SessionCapability, SessionStore};
pub use config::{ApiConfig, Config};
