//! Diagnosticate.me kernel library
//!
//! The navigation shell, its collaborators, and the HTTP host that renders
//! destinations inside it. The `diagnosticate` binary runs the server.

pub mod access;
pub mod auth;
pub mod config;
pub mod csrf;
pub mod db;
pub mod error;
pub mod menu;
pub mod models;
pub mod routes;
pub mod session;
pub mod shell;
pub mod state;
pub mod theme;

pub use config::Config;
pub use state::AppState;
