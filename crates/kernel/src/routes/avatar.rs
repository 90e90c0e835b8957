//! Profile picture of the signed-in user.
//!
//! The shell only links to this route; picture bytes are fetched from the
//! user store when the browser actually requests the avatar image.

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_sessions::Session;

use crate::auth::AuthenticatedUserProvider;
use crate::error::AppError;
use crate::shell::{AVATAR_PATH, ImageResource};
use crate::state::AppState;

use super::helpers::resolve_user;

/// Fallback content type when the bytes are not a recognised image.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Avatar handler.
///
/// GET /user/avatar
async fn avatar(State(state): State<AppState>, session: Session) -> Response {
    let users = match resolve_user(&state, session).await {
        Ok(users) => users,
        Err(e) => return e.into_response(),
    };

    let Some(principal) = users.get() else {
        return AppError::NotFound.into_response();
    };

    let bytes = ImageResource::profile_picture(principal).open().await;
    if bytes.is_empty() {
        return AppError::NotFound.into_response();
    }

    let content_type = infer::get(&bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.mime_type())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, no-cache"),
        ],
        bytes,
    )
        .into_response()
}

/// Create the avatar router.
pub fn router() -> Router<AppState> {
    Router::new().route(AVATAR_PATH, get(avatar))
}
