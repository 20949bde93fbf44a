//! Stockroom: an inventory asset management service.
//!
//! Provides a searchable asset library over HTTP: assets carry editable
//! metadata (name, quantity, description, type, tags) and at most one file
//! attachment, stored through a pluggable storage backend. Access goes through
//! a small fixed-account login gate that routes each role to its library view.
//!
//! The main components are:
//! - [`db::handlers::AssetRepository`]: persistence interface with a Postgres
//!   implementation and an in-memory twin for tests and development
//! - [`db::handlers::FileStorage`]: attachment content storage (local disk,
//!   Postgres large objects, or in-memory)
//! - [`auth::CredentialStore`]: the login gate
//! - [`build_router`]: the Axum HTTP surface, documented via OpenAPI at `/docs`

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::{CredentialStore, StaticCredentialStore};
use crate::config::{Config, DatabaseConfig, StorageConfig};
use crate::db::handlers::{AssetRepository, FileStorage, LocalFileStorage, MemoryAssets, PgAssets, PostgresFileStorage};
use crate::openapi::ApiDoc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn AssetRepository>,
    pub gate: Arc<dyn CredentialStore>,
    pub config: Config,
}

/// Get the stockroom database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // A literal "*" anywhere in the list means wildcard; AllowOrigin::list
    // rejects it as a plain header value
    let allow_origin = if config.cors.allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            origins.push(origin.parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
        .expose_headers(vec![axum::http::header::LOCATION]))
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let upload_limit = state.config.limits.max_upload_size as usize;

    // Mutations accept multipart bodies up to the configured upload limit
    let mutation_routes = Router::new()
        .route(
            "/assets",
            post(api::handlers::assets::upload_asset).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/assets/{id}",
            put(api::handlers::assets::update_asset).layer(DefaultBodyLimit::max(upload_limit)),
        );

    let api_routes = Router::new()
        .merge(mutation_routes)
        .route("/assets", get(api::handlers::assets::list_assets))
        .route("/assets/{id}", get(api::handlers::assets::get_asset))
        .route("/assets/{id}", delete(api::handlers::assets::delete_asset))
        .route("/assets/{id}/download", get(api::handlers::assets::download_asset));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/authentication/login", post(api::handlers::auth::login))
        .nest("/api/v1", api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    Ok(router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

/// The application with its resources initialized and migrations applied.
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting stockroom with configuration: {:#?}", config);

        let (repo, pool): (Arc<dyn AssetRepository>, Option<PgPool>) = match &config.database {
            DatabaseConfig::External { url } => {
                let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
                migrator().run(&pool).await?;

                let storage: Arc<dyn FileStorage> = match &config.storage {
                    StorageConfig::Local { path } => Arc::new(LocalFileStorage::new(path.clone())),
                    StorageConfig::Postgres => Arc::new(PostgresFileStorage::new(pool.clone())),
                };

                (Arc::new(PgAssets::new(pool.clone(), storage)), Some(pool))
            }
            DatabaseConfig::Memory => {
                info!("Using in-memory persistence; assets are lost on shutdown");
                (Arc::new(MemoryAssets::new()), None)
            }
        };

        let gate = Arc::new(StaticCredentialStore::new(
            config.accounts.iter().map(|a| (a.username.clone(), a.password.clone(), a.role)),
        ));

        let state = AppState {
            repo,
            gate,
            config: config.clone(),
        };
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Stockroom listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_state(config: Config) -> AppState {
        let gate = Arc::new(StaticCredentialStore::new(
            config.accounts.iter().map(|a| (a.username.clone(), a.password.clone(), a.role)),
        ));
        AppState {
            repo: Arc::new(MemoryAssets::new()),
            gate,
            config,
        }
    }

    #[test]
    fn test_router_builds_with_default_config() {
        // The default config ships a wildcard CORS origin
        assert!(build_router(memory_state(Config::default())).is_ok());
    }

    #[test]
    fn test_cors_accepts_explicit_origin_list() {
        let mut config = Config::default();
        config.cors.allowed_origins = vec!["https://assets.example.com".to_string(), "http://localhost:5173".to_string()];
        assert!(create_cors_layer(&config).is_ok());
    }

    #[test]
    fn test_cors_rejects_unparseable_origin() {
        let mut config = Config::default();
        config.cors.allowed_origins = vec!["not a header\nvalue".to_string()];
        assert!(create_cors_layer(&config).is_err());
    }
}
