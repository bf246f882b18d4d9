//! HTTP API layer for OWR.
//!
//! This crate provides the JSON API served under `/api`:
//!
//! - **Endpoints**: public catalog, voting, certificates, appointments, content
//!   and the `/admin` tree
//! - **Extractors**: authenticated, optional and administrator callers
//! - **Middleware**: bearer token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
