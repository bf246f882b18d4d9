//! API endpoints.

mod appointments;
mod auth;
mod catalog;
mod certificates;
mod content;
mod files;
mod settings;
mod translation;
mod users;
mod votes;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// Default and maximum page size for admin listings.
const DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 200;

/// Limit/offset pagination query.
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Page {
    /// Requested limit clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// Create the API router. The server nests it under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(catalog::router())
        .nest("/votes", votes::router())
        .nest("/certificates", certificates::router())
        .nest("/appointments", appointments::router())
        .merge(content::router())
        .nest("/settings", settings::router())
        .nest("/translate", translation::router())
        .nest("/files", files::router())
        .nest("/admin", admin_router())
}

/// Every route here takes an `AdminUser`, which checks the role per request.
fn admin_router() -> Router<AppState> {
    Router::new()
        .merge(catalog::admin_router())
        .merge(certificates::admin_router())
        .merge(appointments::admin_router())
        .merge(content::admin_router())
        .merge(users::admin_router())
        .merge(settings::admin_router())
        .merge(files::admin_router())
}
