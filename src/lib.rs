pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod review;
pub mod session;
pub mod table;
pub mod types;

use axum::Router;
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::session::{SessionLocks, SessionStore};
use crate::table::DEFAULT_ROWS;


#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub locks: SessionLocks,
    /// Rows per generated table
    pub rows: usize,
    /// Judgement label seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl AppState {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            locks: SessionLocks::new(),
            rows: DEFAULT_ROWS,
            seed: None,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}


/// API routes plus an optional static-file fallback (`/` serves `index.html`).
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = handler::routes();
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
