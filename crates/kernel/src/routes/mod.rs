//! HTTP route handlers.

pub mod auth;
pub mod avatar;
pub mod health;
pub mod helpers;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// All application routes. Destination pages are served by the fallback.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(avatar::router())
        .merge(health::router())
        .merge(pages::router())
}
