use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handler::*,
    middleware::{load_session, mw_rate_limit, mw_require_auth},
    AppState,
};

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "ignoring unparsable CORS origin");
            cors
        }
    }
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_origin);

    Router::new()
        .route(
            "/create-item",
            post(create_item).route_layer(from_fn_with_state(app_state.clone(), mw_rate_limit)),
        )
        .route("/read-item", get(read_item))
        .route("/edit-item", post(edit_item))
        .route("/delete-item", delete(delete_item))
        .route("/dashboard", get(dashboard_page))
        .route("/logout", post(logout))
        .route("/logout_from_all_devices", post(logout_from_all_devices))
        .route_layer(from_fn(mw_require_auth))
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/", get(health_checker_handler))
        .layer(from_fn_with_state(app_state.clone(), load_session))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
