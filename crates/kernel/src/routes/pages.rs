//! Destination pages.
//!
//! Every registered destination is served by one fallback handler that
//! matches the request path against the registry, checks access, and
//! renders the destination inside the navigation shell.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::auth::{AuthenticatedUserProvider, SESSION_LOGIN_REDIRECT};
use crate::error::AppError;
use crate::shell::LOGIN_PATH;
use crate::state::AppState;

use super::helpers::{render_shell_page, resolve_user};

/// Create the destination router.
pub fn router() -> Router<AppState> {
    Router::new().fallback(destination_page)
}

/// Destination handler.
///
/// - Unknown path: 404
/// - Access denied without a session: remember the path, redirect to the
///   sign-in page
/// - Access denied with a session: 403 inside the shell
async fn destination_page(
    State(state): State<AppState>,
    session: Session,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return AppError::MethodNotAllowed.into_response();
    }

    let Some(destination) = state.destinations().match_path(uri.path()) else {
        return AppError::NotFound.into_response();
    };

    let users = match resolve_user(&state, session.clone()).await {
        Ok(users) => users,
        Err(e) => return e.into_response(),
    };
    let principal = users.get();

    let users: Arc<dyn AuthenticatedUserProvider> = Arc::new(users);
    let mut shell = state.shell(users);

    if !state.access().has_access(principal.as_deref(), destination) {
        debug!(destination = %destination.id, signed_in = principal.is_some(), "access denied");

        if principal.is_none() {
            if let Err(e) = session.insert(SESSION_LOGIN_REDIRECT, &destination.path).await {
                warn!(error = %e, "failed to remember sign-in redirect");
            }
            return Redirect::to(LOGIN_PATH).into_response();
        }

        let content = state
            .theme()
            .tera()
            .render("error/forbidden.html", &tera::Context::new())
            .unwrap_or_else(|_| "Access denied".to_string());
        return render_shell_page(
            &state,
            &shell,
            &session,
            uri.path(),
            &content,
            StatusCode::FORBIDDEN,
        )
        .await;
    }

    shell.after_navigation(destination);

    let content = match state
        .theme()
        .render_view(destination, &mut tera::Context::new())
    {
        Ok(html) => html,
        Err(e) => return AppError::Internal(e).into_response(),
    };

    render_shell_page(&state, &shell, &session, uri.path(), &content, StatusCode::OK).await
}
