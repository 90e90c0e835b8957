//! Destination registry - the ordered list of navigable pages.
//!
//! Declaration order is navigation order. Each destination carries its
//! own page title and access rule so nothing has to be looked up from the
//! destination's view at runtime.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::Access;
use crate::models::Role;

/// Stable identifier of a destination (e.g. "statistics").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A navigable page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    /// Stable identifier.
    pub id: DestinationId,
    /// Navigation label.
    pub label: String,
    /// URL path (e.g., "/statistics").
    pub path: String,
    /// Icon class rendered next to the label.
    pub icon: String,
    /// Title shown in the header bar; `None` leaves it blank.
    #[serde(default)]
    pub page_title: Option<String>,
    /// Who may navigate here.
    pub access: Access,
}

impl Destination {
    /// Create a destination whose page title equals its label.
    pub fn new(
        id: &str,
        label: &str,
        path: &str,
        icon: &str,
        access: Access,
    ) -> Self {
        Self {
            id: DestinationId::new(id),
            label: label.to_string(),
            path: path.to_string(),
            icon: icon.to_string(),
            page_title: Some(label.to_string()),
            access,
        }
    }

    /// Override the page title.
    pub fn with_page_title(mut self, title: Option<&str>) -> Self {
        self.page_title = title.map(str::to_string);
        self
    }
}

/// Ordered registry of destinations.
#[derive(Debug, Clone, Default)]
pub struct DestinationRegistry {
    /// Destinations in declaration order.
    entries: Vec<Destination>,
    /// Destination id -> position in `entries`.
    by_id: HashMap<DestinationId, usize>,
}

impl DestinationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The application's standard destinations, in navigation order.
    pub fn standard() -> Self {
        let admin = Access::roles([Role::Admin.as_str()]);

        let mut registry = Self::new();
        for destination in [
            Destination::new("home", "Home", "/", "la la-home", Access::Anonymous),
            Destination::new("about", "About", "/about", "la la-info-circle", Access::Anonymous),
            Destination::new(
                "diagnostic",
                "Diagnostic",
                "/diagnostic",
                "la la-laptop-medical",
                Access::Authenticated,
            ),
            Destination::new("patients", "Patients", "/patients", "la la-columns", admin.clone()),
            Destination::new(
                "statistics",
                "Statistics",
                "/statistics",
                "la la-chart-area",
                admin,
            ),
            Destination::new(
                "supported-conditions",
                "Supported Conditions",
                "/supported-conditions",
                "la la-th-list",
                Access::Anonymous,
            ),
            Destination::new(
                "donate",
                "Donate",
                "/donate",
                "la la-credit-card",
                Access::Anonymous,
            ),
        ] {
            registry.register(destination);
        }

        debug!(destinations = registry.len(), "built standard destinations");
        registry
    }

    /// Register a destination.
    ///
    /// A destination with an id already present replaces the earlier one in
    /// place, keeping its position.
    pub fn register(&mut self, destination: Destination) {
        match self.by_id.get(&destination.id) {
            Some(&index) => self.entries[index] = destination,
            None => {
                self.by_id
                    .insert(destination.id.clone(), self.entries.len());
                self.entries.push(destination);
            }
        }
    }

    /// Get a destination by its id.
    pub fn get(&self, id: &str) -> Option<&Destination> {
        self.by_id
            .get(&DestinationId::new(id))
            .and_then(|&index| self.entries.get(index))
    }

    /// Page title declared for a destination id.
    pub fn page_title(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|d| d.page_title.as_deref())
    }

    /// Match a request path against registered destinations.
    pub fn match_path(&self, path: &str) -> Option<&Destination> {
        let wanted = normalize_path(path);
        self.entries
            .iter()
            .find(|d| normalize_path(&d.path) == wanted)
    }

    /// Iterate over destinations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.entries.iter()
    }

    /// Get destination count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip a trailing slash, keeping "/" itself.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_order() {
        let registry = DestinationRegistry::standard();
        let labels: Vec<_> = registry.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Home",
                "About",
                "Diagnostic",
                "Patients",
                "Statistics",
                "Supported Conditions",
                "Donate"
            ]
        );
    }

    #[test]
    fn standard_icons() {
        let registry = DestinationRegistry::standard();
        assert_eq!(registry.get("statistics").unwrap().icon, "la la-chart-area");
        assert_eq!(registry.get("donate").unwrap().icon, "la la-credit-card");
    }

    #[test]
    fn page_title_mapping() {
        let mut registry = DestinationRegistry::standard();
        assert_eq!(registry.page_title("statistics"), Some("Statistics"));

        registry.register(
            Destination::new("blank", "Blank", "/blank", "la la-square", Access::Anonymous)
                .with_page_title(None),
        );
        assert_eq!(registry.page_title("blank"), None);
        assert_eq!(registry.page_title("missing"), None);
    }

    #[test]
    fn register_replaces_in_place() {
        let mut registry = DestinationRegistry::standard();
        registry.register(Destination::new(
            "about",
            "About us",
            "/about",
            "la la-info-circle",
            Access::Anonymous,
        ));

        assert_eq!(registry.len(), 7);
        let second = registry.iter().nth(1).unwrap();
        assert_eq!(second.label, "About us");
    }

    #[test]
    fn match_path_exact_and_trailing_slash() {
        let registry = DestinationRegistry::standard();
        assert_eq!(registry.match_path("/").unwrap().id.as_str(), "home");
        assert_eq!(registry.match_path("/donate").unwrap().id.as_str(), "donate");
        assert_eq!(registry.match_path("/donate/").unwrap().id.as_str(), "donate");
        assert!(registry.match_path("/donate/now").is_none());
        assert!(registry.match_path("/admin").is_none());
    }

    #[test]
    fn destination_from_json() {
        let json = r#"{
            "id": "faq",
            "label": "FAQ",
            "path": "/faq",
            "icon": "la la-question",
            "access": {"type": "authenticated"}
        }"#;

        let destination: Destination = serde_json::from_str(json).unwrap();
        assert_eq!(destination.id.as_str(), "faq");
        assert_eq!(destination.page_title, None);
        assert_eq!(destination.access, Access::Authenticated);
    }
}
