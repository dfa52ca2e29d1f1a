//! Role-based presentation.
//!
//! The stored role only selects which dashboard links, sections and identity are shown. It is a
//! cosmetic switch: nothing here restricts access to anything, and any real authorization has to
//! be enforced by a server.

use anyhow::Result;

use crate::dom::Document;
use crate::storage::{Storage, ROLE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    Client,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "admin" => Some(Role::Admin),
            "client" => Some(Role::Client),
            _ => None,
        }
    }

    /// Reads the stored role, defaulting to `Client`.
    pub fn load(storage: &dyn Storage) -> Role {
        storage.get_item(ROLE_KEY)
            .and_then(|r| Role::parse(&r))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }

    pub fn dashboard_url(&self) -> &'static str {
        match self {
            Role::Admin => "admin-dashboard.html",
            Role::Client => "client-dashboard.html",
        }
    }

    pub fn identity(&self) -> &'static Identity {
        match self {
            Role::Admin => &ADMIN_IDENTITY,
            Role::Client => &CLIENT_IDENTITY,
        }
    }
}

/// Demo user shown in the dashboard chrome.
#[derive(Debug)]
pub struct Identity {
    pub name: &'static str,
    pub email: &'static str,
    pub avatar: &'static str,
    pub initials: &'static str,
}

pub const ADMIN_IDENTITY: Identity = Identity {
    name: "Michael Anderson",
    email: "admin@pipelinepro.com",
    avatar: "assets/images/avatar-admin.jpg",
    initials: "MA",
};

pub const CLIENT_IDENTITY: Identity = Identity {
    name: "Sarah Johnson",
    email: "sarah.johnson@gulfcoastenergy.com",
    avatar: "assets/images/avatar-client.jpg",
    initials: "SJ",
};

#[derive(Debug, Clone, Copy)]
pub struct RoleView {
    role: Role,
}

impl RoleView {
    pub fn load(storage: &dyn Storage) -> RoleView {
        RoleView { role: Role::load(storage) }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        for link in doc.select_all("[data-dashboard-link]")? {
            doc.set_attr(link, "href", self.role.dashboard_url());
        }

        for elt in doc.select_all("[data-role]")? {
            if doc.attr(elt, "data-role") == Some(self.role.as_str()) {
                doc.remove_attr(elt, "hidden");
            } else {
                doc.set_attr(elt, "hidden", "");
            }
        }

        let identity = self.role.identity();
        for elt in doc.select_all("[data-user-name]")? {
            doc.set_text(elt, identity.name);
        }
        for elt in doc.select_all("[data-user-email]")? {
            doc.set_text(elt, identity.email);
        }
        for elt in doc.select_all("[data-user-avatar]")? {
            doc.set_attr(elt, "src", identity.avatar);
            doc.set_attr(elt, "alt", identity.name);
        }
        for elt in doc.select_all("[data-user-initials]")? {
            doc.set_text(elt, identity.initials);
        }
        Ok(())
    }
}
