//! CSRF tokens for the sign-in and sign-out forms.
//!
//! Tokens live in the session, are single-use and expire after an hour.

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Session key holding the outstanding tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Outstanding tokens kept per session; the oldest are dropped first.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IssuedToken {
    token: String,
    issued: i64,
}

impl IssuedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now - self.issued <= TOKEN_VALIDITY_SECS
    }
}

async fn load_tokens(session: &Session) -> Vec<IssuedToken> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Issue a token and remember it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let issued = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(issued.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = load_tokens(session).await;
    tokens.push(IssuedToken {
        token: token.clone(),
        issued,
    });
    if tokens.len() > MAX_TOKENS {
        let excess = tokens.len() - MAX_TOKENS;
        tokens = tokens.split_off(excess);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .context("failed to store CSRF token")?;

    Ok(token)
}

/// Check a submitted token, consuming it on success.
///
/// Missing, unknown and expired tokens all yield `false`.
pub async fn verify_csrf_token(session: &Session, submitted: Option<&str>) -> Result<bool> {
    let Some(submitted) = submitted.filter(|s| !s.is_empty()) else {
        return Ok(false);
    };

    let mut tokens = load_tokens(session).await;
    let now = chrono::Utc::now().timestamp();

    let Some(index) = tokens
        .iter()
        .position(|t| t.token == submitted && t.is_fresh(now))
    else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|t| t.is_fresh(now));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .context("failed to update CSRF tokens")?;

    Ok(true)
}
