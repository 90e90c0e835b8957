//! Drawer footer: account menu for signed-in users, sign-in link otherwise.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::auth::Principal;

/// Path of the sign-in page.
pub const LOGIN_PATH: &str = "/login";

/// Path the sign-out action posts to.
pub const LOGOUT_PATH: &str = "/logout";

/// Path serving the signed-in user's profile picture.
pub const AVATAR_PATH: &str = "/user/avatar";

/// Resource name of the avatar image.
pub const PROFILE_PICTURE_RESOURCE: &str = "profile-pic";

/// Footer of the drawer.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Footer {
    SignedIn(UserMenu),
    SignedOut(SignInLink),
}

impl Footer {
    /// Build the footer for the current principal.
    pub fn for_principal(principal: Option<Arc<dyn Principal>>) -> Self {
        match principal {
            Some(principal) => Footer::SignedIn(UserMenu::new(principal)),
            None => Footer::SignedOut(SignInLink::default()),
        }
    }

    /// The account menu, when signed in.
    pub fn user_menu(&self) -> Option<&UserMenu> {
        match self {
            Footer::SignedIn(menu) => Some(menu),
            Footer::SignedOut(_) => None,
        }
    }

    /// The sign-in link, when signed out.
    pub fn sign_in_link(&self) -> Option<&SignInLink> {
        match self {
            Footer::SignedIn(_) => None,
            Footer::SignedOut(link) => Some(link),
        }
    }

    /// Actions offered by the footer.
    pub fn actions(&self) -> &[MenuItem] {
        match self {
            Footer::SignedIn(menu) => &menu.items,
            Footer::SignedOut(_) => &[],
        }
    }
}

/// Account dropdown: avatar, display name and the sign-out action.
#[derive(Debug, Serialize)]
pub struct UserMenu {
    pub name: String,
    pub avatar: Avatar,
    pub items: Vec<MenuItem>,
}

impl UserMenu {
    fn new(principal: Arc<dyn Principal>) -> Self {
        let name = principal.name().to_string();
        Self {
            avatar: Avatar {
                name: name.clone(),
                theme: "xsmall",
                image: ImageResource::profile_picture(principal),
            },
            name,
            items: vec![MenuItem::sign_out()],
        }
    }
}

/// User avatar.
#[derive(Debug, Serialize)]
pub struct Avatar {
    pub name: String,
    pub theme: &'static str,
    pub image: ImageResource,
}

/// Image fetched only when the rendering side asks for its bytes.
#[derive(Serialize)]
pub struct ImageResource {
    pub name: &'static str,
    pub src: &'static str,
    #[serde(skip)]
    owner: Arc<dyn Principal>,
}

impl ImageResource {
    /// The profile picture of `owner`.
    pub fn profile_picture(owner: Arc<dyn Principal>) -> Self {
        Self {
            name: PROFILE_PICTURE_RESOURCE,
            src: AVATAR_PATH,
            owner,
        }
    }

    /// Fetch the image bytes.
    pub async fn open(&self) -> Vec<u8> {
        self.owner.profile_picture().await
    }
}

impl fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResource")
            .field("name", &self.name)
            .field("src", &self.src)
            .field("owner", &self.owner.id())
            .finish()
    }
}

/// What a footer menu entry does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    SignOut,
}

/// Entry of the account dropdown.
#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: MenuAction,
    pub href: &'static str,
}

impl MenuItem {
    fn sign_out() -> Self {
        Self {
            label: "Sign out",
            action: MenuAction::SignOut,
            href: LOGOUT_PATH,
        }
    }
}

/// Link to the sign-in page.
#[derive(Debug, Clone, Serialize)]
pub struct SignInLink {
    pub label: &'static str,
    pub href: &'static str,
}

impl Default for SignInLink {
    fn default() -> Self {
        Self {
            label: "Sign in",
            href: LOGIN_PATH,
        }
    }
}
