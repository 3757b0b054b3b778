pub mod calendar;

use std::sync::Arc;

use axum::{routing::get, Router};
use lc_core::{menu_client::MenuSource, page::PageExtractor};
use tower_http::trace::TraceLayer;

use crate::cache::FileCache;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn MenuSource>,
    pub extractor: Arc<dyn PageExtractor>,
    pub cache: Arc<FileCache>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/:calendar_path", get(calendar::handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
