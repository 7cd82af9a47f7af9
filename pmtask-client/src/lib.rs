//! pmtask-client: typed access to the project-management REST API.
//!
//! - [`api`]: the [`ProjectManagerApi`] trait every caller programs against
//! - [`http`]: [`HttpClient`], the ureq-backed implementation
//! - [`models`]: request and response bodies
//! - [`paging`]: [`Query`] and [`fetch_all`]

pub mod api;
pub mod envelope;
pub mod error;
pub mod http;
pub mod models;
pub mod paging;

pub use api::{ApiResult, ProjectManagerApi};
pub use envelope::ApiResponse;
pub use error::ApiError;
pub use http::{resolve_base_url, HttpClient, PRODUCTION_URL};
pub use paging::{fetch_all, Query, DEFAULT_PAGE_SIZE};
