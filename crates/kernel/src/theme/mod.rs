//! Theme engine and template rendering.
//!
//! Provides Tera-based rendering of the navigation shell, destination
//! bodies and the sign-in page, with template suggestion resolution.

mod engine;

pub use engine::ThemeEngine;
