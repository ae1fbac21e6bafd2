//! HTTP router setup.

use crate::handlers;
use crate::middleware::{api_key_auth, inject_request_id};
use crate::state::AppState;
use crate::Config;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Only the configured browser origins may call the API cross-site.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
}

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    let upload = post(handlers::upload_image)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));
    let admin = Router::new()
        .route(
            "/admin/collections/{name}/price",
            put(handlers::update_price),
        )
        .route(
            "/admin/collections/{name}/toggle",
            post(handlers::toggle_collection),
        )
        .route("/admin/withdraw", post(handlers::withdraw))
        .route_layer(from_fn(api_key_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/state", get(handlers::flow_state))
        .route("/connect", post(handlers::connect))
        .route("/disconnect", post(handlers::disconnect))
        .route("/image/upload", upload)
        .route("/image/generate", post(handlers::generate_image))
        .route("/details", put(handlers::update_details))
        .route("/mint", post(handlers::mint))
        .route("/collections/{name}", get(handlers::collection))
        .route("/collections/{name}/price", get(handlers::collection_price))
        .route("/collections/{name}/affordable", get(handlers::can_afford))
        .route("/tokens/{id}", get(handlers::token))
        .route("/owners/{address}/tokens", get(handlers::owner_tokens))
        .merge(admin)
        .layer(from_fn(inject_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
