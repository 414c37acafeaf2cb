//! REST API client module for the inventory backend.
//!
//! This module provides the `ApiClient` every screen talks through. It
//! attaches the bearer token, enforces the request timeout, unwraps the
//! backend's `{ok, data}` envelope and tears the session down on 401.
//!
//! Resource operations (categories, products, suppliers, orders, users,
//! dashboard and reports) are thin typed layers over the same client.

pub mod client;
pub mod delete;
pub mod envelope;
pub mod error;
pub mod reports;
pub mod request;
pub mod resources;

pub use client::{ApiClient, ApiResult, LoginOutcome, NewAccount};
pub use delete::{DeleteOutcome, PendingDelete};
pub use error::{ApiError, ClientError};
pub use reports::{ExportFormat, ExportTarget};
pub use request::ApiRequest;
pub use resources::OrderFilter;
