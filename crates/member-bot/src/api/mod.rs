//! HTTP surface: Telegram webhook ingress and the admin points API.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{
    admin_auth_middleware, hash_secret, logging_middleware, rate_limit_middleware,
    secrets_match, RateLimitState,
};
pub use types::*;

use crate::commands::Dispatcher;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use member_store::MemberStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Routes webhook messages to command handlers
    pub dispatcher: Dispatcher,
    /// Member and points ledger
    pub store: Arc<MemberStore>,
    /// Whether a bot token is configured
    pub telegram_configured: bool,
    /// Expected value of the webhook secret header, if any
    pub webhook_secret: Option<String>,
    /// Bearer token for the admin API; admin routes are closed without it
    pub admin_token: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(dispatcher: Dispatcher, store: Arc<MemberStore>, telegram_configured: bool) -> Self {
        Self {
            dispatcher,
            store,
            telegram_configured,
            webhook_secret: None,
            admin_token: None,
        }
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty());
        self
    }
}

/// Create the API router with the default admin rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(60))
}

/// Create the API router with a custom admin rate limit.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    // Admin endpoints (bearer token, rate limited)
    let admin = Router::new()
        .route("/v1/members/:code", get(handlers::get_member))
        .route("/v1/members/:code/exclusion", post(handlers::set_exclusion))
        .route("/v1/points/adjust", post(handlers::adjust_points))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/webhook", post(handlers::webhook))
        .merge(admin)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
