//! Static file serving with cache-disabling headers.
//!
//! Files come from the served root through `ServeDir`, which appends
//! `index.html` for directories and rejects paths escaping the root. Anything
//! it cannot answer falls through to the directory listing handler.

use std::path::Path;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{CACHE_CONTROL_NO_CACHE, EXPIRES_IMMEDIATELY, PRAGMA_NO_CACHE};
use crate::http::listing::directory_listing;
use crate::middleware::request_id_layer;

/// File service for `root` with the listing fallback.
pub fn create_static_service(root: &Path) -> ServeDir<MethodRouter> {
    let listing = get(directory_listing).with_state(Arc::new(root.to_path_buf()));

    ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(listing)
}

/// Creates the router serving `root`.
///
/// The no-cache headers override whatever inner services set, so they are
/// present on files, listings, redirects and errors alike.
pub fn create_router(root: &Path) -> Router {
    Router::new()
        .fallback_service(create_static_service(root))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PRAGMA,
            HeaderValue::from_static(PRAGMA_NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            EXPIRES,
            HeaderValue::from_static(EXPIRES_IMMEDIATELY),
        ))
        .layer(TraceLayer::new_for_http())
        // Outermost, so the request span wraps everything else
        .layer(middleware::from_fn(request_id_layer))
}
