//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::access::{AccessChecker, RoleAccessChecker};
use crate::auth::AuthenticatedUserProvider;
use crate::config::Config;
use crate::db;
use crate::menu::DestinationRegistry;
use crate::models::{PgUserStore, UserStore};
use crate::shell::NavigationShell;
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Application name shown in the drawer header.
    app_name: String,

    /// User accounts.
    users: Arc<dyn UserStore>,

    /// Navigable destinations in menu order.
    destinations: DestinationRegistry,

    /// Access rule evaluation for destinations.
    access: Arc<dyn AccessChecker>,

    /// Template engine.
    theme: ThemeEngine,
}

impl AppState {
    /// Create application state backed by PostgreSQL.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        let theme = match &config.templates_dir {
            Some(dir) => ThemeEngine::new(dir).context("failed to load templates")?,
            None => ThemeEngine::builtin().context("failed to load built-in templates")?,
        };

        let destinations = DestinationRegistry::standard();
        info!(destinations = destinations.len(), "destinations registered");

        Ok(Self::from_parts(
            config.app_name.clone(),
            Arc::new(PgUserStore::new(pool)),
            destinations,
            Arc::new(RoleAccessChecker),
            theme,
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        app_name: String,
        users: Arc<dyn UserStore>,
        destinations: DestinationRegistry,
        access: Arc<dyn AccessChecker>,
        theme: ThemeEngine,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                app_name,
                users,
                destinations,
                access,
                theme,
            }),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// Get the user store.
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.inner.users
    }

    /// Get the destination registry.
    pub fn destinations(&self) -> &DestinationRegistry {
        &self.inner.destinations
    }

    /// Get the access checker.
    pub fn access(&self) -> &dyn AccessChecker {
        self.inner.access.as_ref()
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    /// Build a navigation shell for the given user provider.
    pub fn shell(&self, users: Arc<dyn AuthenticatedUserProvider>) -> NavigationShell {
        NavigationShell::new(
            self.app_name(),
            self.destinations(),
            users,
            self.access(),
        )
    }
}
