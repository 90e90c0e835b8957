#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Builds the REAL router and state, backed by the in-memory user store and
//! the in-memory session store so no external services are needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use diagnosticate_kernel::AppState;
use diagnosticate_kernel::access::RoleAccessChecker;
use diagnosticate_kernel::menu::DestinationRegistry;
use diagnosticate_kernel::models::{CreateUser, MemoryUserStore, Role, User, UserStore};
use diagnosticate_kernel::theme::ThemeEngine;

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "test-password-123";

/// Smallest byte sequence `infer` recognises as PNG.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// Test application wrapper using the REAL routes and state.
pub struct TestApp {
    router: Router,
    pub users: Arc<MemoryUserStore>,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application with the standard destinations.
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::new());

        let state = AppState::from_parts(
            "Diagnosticate.me".to_string(),
            users.clone(),
            DestinationRegistry::standard(),
            Arc::new(RoleAccessChecker),
            ThemeEngine::builtin().expect("built-in templates"),
        );

        // Must match main.rs, minus the Redis store
        let router = diagnosticate_kernel::routes::router()
            .layer(SessionManagerLayer::new(MemoryStore::default()))
            .with_state(state.clone());

        Self {
            router,
            users,
            state,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `path`, optionally with session cookies.
    pub async fn get(&self, path: &str, cookies: &str) -> Response {
        let mut request = Request::get(path).body(Body::empty()).unwrap();
        if !cookies.is_empty() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookies.parse().expect("Invalid cookie header"));
        }
        self.request(request).await
    }

    /// POST a form body to `path`, optionally with session cookies.
    pub async fn post_form(&self, path: &str, body: &str, cookies: &str) -> Response {
        let mut request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        if !cookies.is_empty() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookies.parse().expect("Invalid cookie header"));
        }
        self.request(request).await
    }

    /// Create a user directly in the store.
    pub async fn create_user(
        &self,
        username: &str,
        name: &str,
        roles: Vec<Role>,
        profile_picture: Option<Vec<u8>>,
    ) -> User {
        self.users
            .create(CreateUser {
                username: username.to_string(),
                name: name.to_string(),
                password: TEST_PASSWORD.to_string(),
                roles,
                profile_picture,
            })
            .await
            .expect("Failed to create test user")
    }

    /// Sign in through the form and return the session cookies.
    ///
    /// # Panics
    ///
    /// Panics if sign-in does not redirect.
    pub async fn login(&self, username: &str) -> String {
        let (_, cookies) = self.login_with(username, "").await;
        cookies
    }

    /// Sign in on top of an existing session.
    ///
    /// Returns the redirect location and the session cookies.
    pub async fn login_with(&self, username: &str, cookies: &str) -> (String, String) {
        let response = self.get("/login", cookies).await;
        let cookies = cookies_after(&response, cookies);
        let token = csrf_token(&response_text(response).await);

        let response = self
            .post_form(
                "/login",
                &format!("username={username}&password={TEST_PASSWORD}&_token={token}"),
                &cookies,
            )
            .await;

        assert_eq!(
            response.status(),
            axum::http::StatusCode::SEE_OTHER,
            "Login failed for user '{username}' (status {})",
            response.status()
        );

        let location = response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string();
        (location, cookies_after(&response, &cookies))
    }

    /// Sign out through the account menu's form.
    pub async fn logout(&self, cookies: &str) -> Response {
        let response = self.get("/", cookies).await;
        let cookies = cookies_after(&response, cookies);
        let token = csrf_token(&response_text(response).await);

        self.post_form("/logout", &format!("_token={token}"), &cookies)
            .await
    }
}

/// Cookies to send next: those set by `response`, else the previous ones.
pub fn cookies_after(response: &Response, previous: &str) -> String {
    let set = extract_cookies(response);
    if set.is_empty() {
        previous.to_string()
    } else {
        set
    }
}

/// Value of the first hidden `_token` field in a page.
pub fn csrf_token(html: &str) -> String {
    let marker = "name=\"_token\" value=\"";
    let start = html.find(marker).expect("form token field") + marker.len();
    let end = html[start..].find('"').expect("form token end") + start;
    html[start..end].to_string()
}

/// Extract Set-Cookie headers from a response for use in subsequent requests.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Read a response body as text.
pub async fn response_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read a response body as raw bytes.
pub async fn response_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Text of the header title element.
pub fn view_title(html: &str) -> &str {
    let start = html
        .find("<h2 class=\"view-title\">")
        .map(|i| i + "<h2 class=\"view-title\">".len())
        .expect("view title element");
    let end = html[start..].find("</h2>").expect("view title end") + start;
    &html[start..end]
}

/// Labels of the rendered navigation entries, in page order.
pub fn nav_destinations(html: &str) -> Vec<String> {
    html.split("data-destination=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}
