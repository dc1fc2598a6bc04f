//! Typed client for the OKR API gateway.
//!
//! Provides the REST collection handles, dashboard and settings endpoints,
//! environment-based configuration, request supersession tracking and the
//! cycle report used by the `okr-report` binary.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod query;
pub mod report;
pub mod tracker;

pub use api::{ApiClient, Resource};
pub use config::ClientConfig;
pub use error::ClientError;
pub use query::ListQuery;
pub use tracker::RequestTracker;
