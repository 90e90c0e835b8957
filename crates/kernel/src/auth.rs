//! Authenticated user resolution.
//!
//! The navigation shell never looks up session state on its own. It is
//! handed an [`AuthenticatedUserProvider`] that answers "who is signed in"
//! and knows how to sign that user out.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tower_sessions::Session;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{User, UserStore};

/// Session key for the authenticated user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Session key for the page to return to after signing in.
pub const SESSION_LOGIN_REDIRECT: &str = "login_redirect";

/// A signed-in identity as seen by the shell and the access checker.
#[async_trait]
pub trait Principal: Send + Sync {
    /// Stable user identifier.
    fn id(&self) -> Uuid;

    /// Display name.
    fn name(&self) -> &str;

    /// Role names held by this principal.
    fn roles(&self) -> &[String];

    /// Raw profile picture bytes; empty when the user has none.
    ///
    /// Called on demand only, when an avatar image is actually fetched.
    async fn profile_picture(&self) -> Vec<u8>;

    /// Check whether any of the principal's roles matches `role`.
    fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

/// Source of the current user and the sign-out action.
#[async_trait]
pub trait AuthenticatedUserProvider: Send + Sync {
    /// The signed-in user, if any.
    fn get(&self) -> Option<Arc<dyn Principal>>;

    /// End the current session.
    ///
    /// Failures are reported through the provider's own logging; callers
    /// receive nothing back.
    async fn logout(&self);
}

/// A user account signed in through the session.
///
/// Holds the store so the profile picture can be fetched when asked for.
pub struct SessionUser {
    user: User,
    store: Arc<dyn UserStore>,
}

#[async_trait]
impl Principal for SessionUser {
    fn id(&self) -> Uuid {
        self.user.id
    }

    fn name(&self) -> &str {
        &self.user.name
    }

    fn roles(&self) -> &[String] {
        &self.user.roles
    }

    async fn profile_picture(&self) -> Vec<u8> {
        match self.store.find_profile_picture(self.user.id).await {
            Ok(picture) => picture.unwrap_or_default(),
            Err(e) => {
                error!(error = %e, user_id = %self.user.id, "failed to load profile picture");
                Vec::new()
            }
        }
    }
}

/// Provider resolved from a `tower-sessions` session for one request.
pub struct SessionUserProvider {
    session: Session,
    user: Option<Arc<SessionUser>>,
}

impl SessionUserProvider {
    /// Load the session's user through the store.
    ///
    /// A missing, unknown, or blocked user yields an anonymous provider. A
    /// session still pointing at an unknown or blocked user is flushed.
    pub async fn resolve(store: Arc<dyn UserStore>, session: Session) -> Result<Self> {
        let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

        let Some(user_id) = user_id else {
            return Ok(Self {
                session,
                user: None,
            });
        };

        let user = store
            .find_by_id(user_id)
            .await
            .context("failed to load session user")?
            .filter(User::is_active);

        let Some(user) = user else {
            info!(user_id = %user_id, "discarding session of unknown or blocked user");
            session
                .flush()
                .await
                .context("failed to flush stale session")?;
            return Ok(Self {
                session,
                user: None,
            });
        };

        Ok(Self {
            session,
            user: Some(Arc::new(SessionUser { user, store })),
        })
    }

    /// Bind `user` to the session, rotating the session id.
    pub async fn login(session: &Session, user: &User) -> Result<()> {
        session
            .cycle_id()
            .await
            .context("failed to rotate session id")?;
        session
            .insert(SESSION_USER_ID, user.id)
            .await
            .context("failed to store user id in session")?;

        info!(user_id = %user.id, "user logged in");
        Ok(())
    }
}

#[async_trait]
impl AuthenticatedUserProvider for SessionUserProvider {
    fn get(&self) -> Option<Arc<dyn Principal>> {
        self.user
            .as_ref()
            .map(|user| Arc::clone(user) as Arc<dyn Principal>)
    }

    async fn logout(&self) {
        let user_id = self.user.as_ref().map(|u| u.user.id);

        match self.session.flush().await {
            Ok(()) => {
                if let Some(id) = user_id {
                    info!(user_id = %id, "user logged out");
                }
            }
            Err(e) => error!(error = %e, "failed to flush session on logout"),
        }
    }
}
