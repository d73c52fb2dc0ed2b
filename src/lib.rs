use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use config::Config;
use redis::Client as RedisClient;
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod middleware;
pub mod phone;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
}

/// Builds the API router, nested under the configured base path.
///
/// Rate limiting, error logging and CORS are layered on by `main`; tests
/// call this directly to exercise routes without those layers.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/send-otp", post(routes::auth::send_otp))
        .route("/auth/verify-otp", post(routes::auth::verify_otp))
        .route("/auth/forgot-password", post(routes::auth::forgot_password))
        .route("/auth/reset-password", post(routes::auth::reset_password));

    let protected_routes = Router::new()
        .route(
            "/auth/me",
            get(routes::profile::get_me).put(routes::profile::update_me),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .nest(
            &state.config.api_base_uri.clone(),
            Router::new().merge(public_routes).merge(protected_routes),
        )
        .with_state(state)
}
