//! OWR server entry point.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use owr_api::{AppState, auth_middleware, router as api_router};
use owr_common::{
    Config,
    config::{LogFormat, ServerConfig},
};
use owr_core::{EmailService, Mailer};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Slack above the upload limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(format: LogFormat) {
    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "owr=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Liveness plus a database round trip.
async fn health(State(db): State<Arc<DatabaseConnection>>) -> impl IntoResponse {
    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}

/// The full HTTP stack: health check, API routes, auth and tower-http layers.
fn build_app(state: AppState, db: Arc<DatabaseConnection>, server: &ServerConfig) -> Router {
    let body_limit = server.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health).with_state(db))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(server.request_timeout_secs),
                ))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(config.log.format);

    info!("Starting OWR server...");

    let db = Arc::new(owr_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    owr_db::migrate(&db).await?;
    info!("Migrations completed");

    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(&config.email)?);
    info!(provider = ?config.email.provider, "Email configured");

    let state = AppState::new(Arc::clone(&db), &config, mailer)?;
    if !config.admin.emails.is_empty() {
        info!(count = config.admin.emails.len(), "Admin bootstrap emails configured");
    }

    let app = build_app(state, Arc::clone(&db), &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use owr_common::config::{
        AdminSettings, DatabaseConfig, EmailSettings, LogSettings, StorageSettings,
        TranslationSettings,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                url: "http://localhost:3000".to_string(),
                max_upload_bytes: 1024,
                request_timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/owr_test".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            storage: StorageSettings {
                base_path: std::env::temp_dir().join("owr-server-tests"),
                public_base_url: "/api/files".to_string(),
                signing_secret: "test-secret".to_string(),
                signed_url_ttl_secs: 60,
            },
            email: EmailSettings::default(),
            translation: TranslationSettings::default(),
            admin: AdminSettings::default(),
            log: LogSettings::default(),
        }
    }

    fn app() -> Router {
        let config = test_config();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(&config.email).unwrap());
        let state = AppState::new(Arc::clone(&db), &config, mailer).unwrap();
        build_app(state, db, &config.server)
    }

    #[tokio::test]
    async fn test_health_through_full_stack() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = vec![b'a'; 1024 + MULTIPART_OVERHEAD + 1];
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
