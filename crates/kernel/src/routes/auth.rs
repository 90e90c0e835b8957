//! Authentication routes (sign in, sign out).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::auth::{AuthenticatedUserProvider, SESSION_LOGIN_REDIRECT, SessionUserProvider};
use crate::csrf::{generate_csrf_token, verify_csrf_token};
use crate::error::AppError;
use crate::shell::{LOGIN_PATH, LOGOUT_PATH, MenuAction};
use crate::state::AppState;

use super::helpers::{html_escape, resolve_user};

/// Where sign-in lands when no page was requested, and where sign-out lands.
const HOME_PATH: &str = "/";

/// Form-based login request.
#[derive(Debug, Deserialize)]
pub struct LoginFormRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "_token")]
    pub csrf_token: Option<String>,
}

/// Sign-out form.
#[derive(Debug, Deserialize)]
pub struct LogoutFormRequest {
    #[serde(rename = "_token")]
    pub csrf_token: Option<String>,
}

/// Login form handler.
///
/// GET /login
async fn login_form(State(state): State<AppState>, session: Session) -> Response {
    render_login(&state, &session, None, None, StatusCode::OK).await
}

/// Form-based login handler.
///
/// POST /login (form data)
/// - Returns to the destination that sent the visitor here, if any
async fn login_form_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginFormRequest>,
) -> Response {
    match verify_csrf_token(&session, form.csrf_token.as_deref()).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("sign-in rejected: invalid form token");
            return render_login(
                &state,
                &session,
                Some("Invalid form token. Please try again."),
                Some(&form.username),
                StatusCode::FORBIDDEN,
            )
            .await;
        }
        Err(e) => return AppError::Internal(e).into_response(),
    }

    let user = match state.users().find_by_username(&form.username).await {
        Ok(user) => user,
        Err(e) => return AppError::Internal(e).into_response(),
    };

    let Some(user) = user.filter(|u| u.is_active() && u.verify_password(&form.password)) else {
        warn!(username = %form.username, "failed sign-in attempt");
        return render_login(
            &state,
            &session,
            Some("Invalid username or password"),
            Some(&form.username),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    };

    let requested: Option<String> = session
        .remove(SESSION_LOGIN_REDIRECT)
        .await
        .ok()
        .flatten();

    if let Err(e) = SessionUserProvider::login(&session, &user).await {
        return AppError::Internal(e).into_response();
    }

    // Only registered destinations are followed
    let target = requested
        .as_deref()
        .and_then(|path| state.destinations().match_path(path))
        .map_or(HOME_PATH, |d| d.path.as_str());

    Redirect::to(target).into_response()
}

/// Logout handler.
///
/// POST /logout
/// - Activates the shell's sign-out action, which flushes the session
async fn logout(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LogoutFormRequest>,
) -> Response {
    match verify_csrf_token(&session, form.csrf_token.as_deref()).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("sign-out rejected: invalid form token");
            return AppError::Forbidden.into_response();
        }
        Err(e) => return AppError::Internal(e).into_response(),
    }

    let users = match resolve_user(&state, session).await {
        Ok(users) => users,
        Err(e) => return e.into_response(),
    };

    let users: Arc<dyn AuthenticatedUserProvider> = Arc::new(users);
    let shell = state.shell(users);

    if !shell.activate(MenuAction::SignOut).await {
        info!("sign-out requested without a session");
    }

    Redirect::to(HOME_PATH).into_response()
}

/// Render the sign-in page with a fresh form token.
async fn render_login(
    state: &AppState,
    session: &Session,
    error: Option<&str>,
    username: Option<&str>,
    status: StatusCode,
) -> Response {
    let csrf_token = match generate_csrf_token(session).await {
        Ok(token) => token,
        Err(e) => return AppError::Internal(e).into_response(),
    };

    let mut context = tera::Context::new();
    context.insert("app_name", state.app_name());
    context.insert("csrf_token", &csrf_token);
    if let Some(error) = error {
        context.insert("error", error);
    }
    if let Some(username) = username {
        context.insert("username", username);
    }

    match state.theme().tera().render("user/login.html", &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render login form");
            (
                status,
                Html(format!(
                    r#"<!DOCTYPE html>
<html><head><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
<p>{}</p>
<form method="post" action="{LOGIN_PATH}">
<input type="hidden" name="_token" value="{csrf_token}">
<p><label>Username<br><input type="text" name="username" required></label></p>
<p><label>Password<br><input type="password" name="password" required></label></p>
<p><button type="submit">Sign in</button></p>
</form>
</body></html>"#,
                    html_escape(error.unwrap_or_default())
                )),
            )
                .into_response()
        }
    }
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login_form_submit))
        .route(LOGOUT_PATH, post(logout))
}
