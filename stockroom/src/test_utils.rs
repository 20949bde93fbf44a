//! Shared helpers for handler tests.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;

use crate::AppState;
use crate::auth::StaticCredentialStore;
use crate::config::Config;
use crate::db::handlers::MemoryAssets;

/// A test server over a fully in-memory application: memory-backed repository
/// and the default fixed accounts. No database required.
pub fn create_test_app() -> TestServer {
    let config = Config::default();
    let gate = Arc::new(StaticCredentialStore::new(
        config.accounts.iter().map(|a| (a.username.clone(), a.password.clone(), a.role)),
    ));
    let state = AppState {
        repo: Arc::new(MemoryAssets::new()),
        gate,
        config,
    };
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Header marking a request as an asynchronous (JSON-expecting) caller.
pub fn ajax_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    )
}
