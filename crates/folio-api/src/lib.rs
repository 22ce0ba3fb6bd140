pub mod auth;
pub mod config;
pub mod documents;
pub mod error;
pub mod health;
pub mod middleware;
pub mod state;
pub mod token;
pub mod upload;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;

use folio_types::models::{AboutProfile, BlogPost, ContactMessage, Project};

use crate::state::AppState;

/// The complete HTTP surface: health, `/api/*`, and `/uploads` when images are
/// stored on local disk. Cross-cutting layers (CORS, tracing) are left to the
/// caller.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .merge(documents::routes::<BlogPost>(&state))
        .merge(documents::routes::<Project>(&state))
        .merge(documents::routes::<AboutProfile>(&state))
        .merge(documents::routes::<ContactMessage>(&state));

    let mut app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/api", api);

    if let Some(dir) = state.images.local_dir() {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.with_state(state)
}

pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
