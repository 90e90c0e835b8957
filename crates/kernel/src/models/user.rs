//! User model and user stores.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Role;

/// Status of an account that may sign in.
const STATUS_ACTIVE: i16 = 1;

/// Status of a blocked account.
const STATUS_BLOCKED: i16 = 0;

/// Columns of [`User`]. The profile picture is fetched separately, on demand.
const USER_COLUMNS: &str = "id, username, name, hashed_password, roles, status, created";

/// User record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub roles: Vec<String>,
    pub status: i16,
    pub created: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub name: String,
    pub password: String,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub profile_picture: Option<Vec<u8>>,
}

impl User {
    /// Check if this user is active.
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.hashed_password.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.hashed_password) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Build an active user record from creation input, hashing the password.
    ///
    /// The profile picture is handed back separately.
    fn from_input(input: CreateUser) -> Result<(Self, Option<Vec<u8>>)> {
        let user = Self {
            id: Uuid::now_v7(),
            username: input.username,
            name: input.name,
            hashed_password: hash_password(&input.password)?,
            roles: input.roles.iter().map(|r| r.as_str().to_string()).collect(),
            status: STATUS_ACTIVE,
            created: Utc::now(),
        };

        Ok((user, input.profile_picture))
    }
}

/// Lookup of user accounts by id or username.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Profile picture bytes of a user, if one was uploaded.
    async fn find_profile_picture(&self, id: Uuid) -> Result<Option<Vec<u8>>>;

    /// Create a new user.
    async fn create(&self, input: CreateUser) -> Result<User>;

    /// Block or unblock a user. Returns `false` when no such user exists.
    async fn set_active(&self, username: &str, active: bool) -> Result<bool>;

    /// Whether the backing store is reachable.
    async fn is_healthy(&self) -> bool;
}

fn status_for(active: bool) -> i16 {
    if active { STATUS_ACTIVE } else { STATUS_BLOCKED }
}

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user by username")?;

        Ok(user)
    }

    async fn find_profile_picture(&self, id: Uuid) -> Result<Option<Vec<u8>>> {
        let picture = sqlx::query_scalar::<_, Option<Vec<u8>>>(
            "SELECT profile_picture FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch profile picture")?;

        Ok(picture.flatten())
    }

    async fn create(&self, input: CreateUser) -> Result<User> {
        let (user, profile_picture) = User::from_input(input)?;

        let sql = format!(
            "INSERT INTO users (id, username, name, hashed_password, roles, profile_picture, status, created) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.hashed_password)
            .bind(&user.roles)
            .bind(&profile_picture)
            .bind(user.status)
            .bind(user.created)
            .fetch_one(&self.pool)
            .await
            .context("failed to create user")?;

        Ok(user)
    }

    async fn set_active(&self, username: &str, active: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET status = $1 WHERE username = $2")
            .bind(status_for(active))
            .bind(username)
            .execute(&self.pool)
            .await
            .context("failed to update user status")?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}

/// In-memory user store keyed by user id.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    pictures: DashMap<Uuid, Vec<u8>>,
    picture_reads: AtomicUsize,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// How many times a profile picture has been fetched.
    pub fn picture_reads(&self) -> usize {
        self.picture_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn find_profile_picture(&self, id: Uuid) -> Result<Option<Vec<u8>>> {
        self.picture_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.pictures.get(&id).map(|p| p.value().clone()))
    }

    async fn create(&self, input: CreateUser) -> Result<User> {
        if self.find_by_username(&input.username).await?.is_some() {
            anyhow::bail!("username '{}' is already taken", input.username);
        }

        let (user, profile_picture) = User::from_input(input)?;
        if let Some(picture) = profile_picture {
            self.pictures.insert(user.id, picture);
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_active(&self, username: &str, active: bool) -> Result<bool> {
        let Some(mut user) = self.users.iter_mut().find(|u| u.username == username) else {
            return Ok(false);
        };

        user.status = status_for(active);
        Ok(true)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
