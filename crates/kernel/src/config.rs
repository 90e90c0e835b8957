//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::session::DEFAULT_SESSION_EXPIRY_HOURS;

/// Default application name shown at the top of the drawer.
pub const DEFAULT_APP_NAME: &str = "Diagnosticate.me";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for the session store.
    pub redis_url: String,

    /// Directory of template overrides. Built-in templates are used when unset.
    pub templates_dir: Option<PathBuf>,

    /// Application name rendered in the drawer header.
    pub app_name: String,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "strict").
    pub cookie_same_site: String,

    /// Session inactivity expiry in hours (default: 24).
    pub session_expiry_hours: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let templates_dir = env::var("TEMPLATES_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let app_name = env::var("APP_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_lowercase();

        let session_expiry_hours = match env::var("SESSION_EXPIRY_HOURS") {
            Ok(value) => value
                .parse()
                .context("SESSION_EXPIRY_HOURS must be a valid integer")?,
            Err(_) => DEFAULT_SESSION_EXPIRY_HOURS,
        };

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            templates_dir,
            app_name,
            cookie_same_site,
            session_expiry_hours,
        })
    }
}
