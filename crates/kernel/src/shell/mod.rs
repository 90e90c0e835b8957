//! Navigation shell: the persistent chrome around every destination.
//!
//! The shell is built once per view tree from two injected collaborators,
//! an [`AuthenticatedUserProvider`] and an [`AccessChecker`]:
//!
//! - a header with the drawer toggle and the current page title
//! - a drawer with the application name, the navigation entries the
//!   principal may visit, and an account footer
//!
//! After construction the only state that changes is the header title,
//! written by [`NavigationShell::after_navigation`].

mod footer;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::access::AccessChecker;
use crate::auth::AuthenticatedUserProvider;
use crate::menu::{Destination, DestinationId, DestinationRegistry};

pub use footer::{
    AVATAR_PATH, Avatar, Footer, ImageResource, LOGIN_PATH, LOGOUT_PATH, MenuAction, MenuItem,
    PROFILE_PICTURE_RESOURCE, SignInLink, UserMenu,
};

/// Header bar above the content area.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub toggle: DrawerToggle,
    /// Title of the current destination; blank until the first navigation.
    pub title: String,
}

/// Control that shows or hides the drawer.
#[derive(Debug, Clone, Serialize)]
pub struct DrawerToggle {
    pub aria_label: &'static str,
}

impl Default for DrawerToggle {
    fn default() -> Self {
        Self {
            aria_label: "Menu toggle",
        }
    }
}

/// Collapsible side panel.
#[derive(Debug, Serialize)]
pub struct Drawer {
    pub app_name: String,
    pub navigation: Vec<NavItem>,
    pub footer: Footer,
}

/// Entry of the navigation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub destination: DestinationId,
    pub label: String,
    pub path: String,
    pub icon: String,
}

impl From<&Destination> for NavItem {
    fn from(destination: &Destination) -> Self {
        Self {
            destination: destination.id.clone(),
            label: destination.label.clone(),
            path: destination.path.clone(),
            icon: destination.icon.clone(),
        }
    }
}

/// The navigation shell.
#[derive(Serialize)]
pub struct NavigationShell {
    header: Header,
    drawer: Drawer,
    #[serde(skip)]
    users: Arc<dyn AuthenticatedUserProvider>,
}

impl NavigationShell {
    /// Build the header and drawer for the current principal.
    ///
    /// Every destination is checked against `access` on each construction;
    /// entries that fail the check are left out of the navigation list.
    pub fn new(
        app_name: impl Into<String>,
        destinations: &DestinationRegistry,
        users: Arc<dyn AuthenticatedUserProvider>,
        access: &dyn AccessChecker,
    ) -> Self {
        let principal = users.get();

        let navigation: Vec<NavItem> = destinations
            .iter()
            .filter(|d| access.has_access(principal.as_deref(), d))
            .map(NavItem::from)
            .collect();

        debug!(
            visible = navigation.len(),
            total = destinations.len(),
            signed_in = principal.is_some(),
            "built navigation shell"
        );

        Self {
            header: Header {
                toggle: DrawerToggle::default(),
                title: String::new(),
            },
            drawer: Drawer {
                app_name: app_name.into(),
                navigation,
                footer: Footer::for_principal(principal),
            },
            users,
        }
    }

    /// Post-navigation hook: show the destination's page title.
    ///
    /// Destinations without a declared title blank the header.
    pub fn after_navigation(&mut self, destination: &Destination) {
        self.header.title = destination.page_title.clone().unwrap_or_default();
    }

    /// Current header title.
    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn drawer(&self) -> &Drawer {
        &self.drawer
    }

    /// Visible navigation entries, in declaration order.
    pub fn navigation(&self) -> &[NavItem] {
        &self.drawer.navigation
    }

    pub fn footer(&self) -> &Footer {
        &self.drawer.footer
    }

    /// Activate a footer menu action.
    ///
    /// Returns `false` when the footer does not offer `action`.
    pub async fn activate(&self, action: MenuAction) -> bool {
        if !self.footer().actions().iter().any(|i| i.action == action) {
            return false;
        }

        match action {
            MenuAction::SignOut => self.users.logout().await,
        }
        true
    }
}
