//! Shared route helpers for page rendering.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tower_sessions::Session;

use crate::auth::SessionUserProvider;
use crate::csrf::generate_csrf_token;
use crate::error::AppError;
use crate::shell::NavigationShell;
use crate::state::AppState;

/// Resolve the session's user provider.
pub async fn resolve_user(
    state: &AppState,
    session: Session,
) -> Result<SessionUserProvider, AppError> {
    SessionUserProvider::resolve(Arc::clone(state.users()), session)
        .await
        .map_err(AppError::Internal)
}

/// Render `content` inside the navigation shell.
///
/// When the footer offers actions, a CSRF token for their forms is issued
/// into `session`. Template failures fall back to a bare page so the content
/// still reaches the client.
pub async fn render_shell_page(
    state: &AppState,
    shell: &NavigationShell,
    session: &Session,
    path: &str,
    content: &str,
    status: StatusCode,
) -> Response {
    let mut context = tera::Context::new();

    if !shell.footer().actions().is_empty() {
        let csrf_token = generate_csrf_token(session).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to issue CSRF token");
            String::new()
        });
        context.insert("csrf_token", &csrf_token);
    }

    match state.theme().render_page(path, shell, content, &mut context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %path, "failed to render page");
            (
                status,
                Html(format!(
                    r#"<!DOCTYPE html>
<html><head><title>{}</title></head>
<body>{}</body></html>"#,
                    html_escape(shell.title()),
                    content
                )),
            )
                .into_response()
        }
    }
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
