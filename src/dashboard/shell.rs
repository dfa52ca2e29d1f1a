//! Dashboard chrome: the collapsible sidebar and the header dropdowns.

use anyhow::Result;
use ego_tree::NodeId;

use crate::dom::Document;

/// Below this viewport width the sidebar is an overlay that closes on outside clicks.
pub const SIDEBAR_BREAKPOINT: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownKind {
    UserMenu,
    Notifications,
}

#[derive(Debug, Clone, Copy)]
struct Dropdown {
    kind: DropdownKind,
    panel: NodeId,
    button: NodeId,
}

#[derive(Debug, Default)]
pub struct Shell {
    sidebar: Option<NodeId>,
    toggles: Vec<NodeId>,
    dropdowns: Vec<Dropdown>,
}

impl Shell {
    pub fn bind(doc: &mut Document) -> Result<Shell> {
        let mut dropdowns = Vec::new();
        for (kind, panel, button) in [
            (DropdownKind::UserMenu, ".user-menu-dropdown", ".user-menu-btn"),
            (DropdownKind::Notifications, ".notification-dropdown", ".notification-btn"),
        ] {
            if let (Some(panel), Some(button)) = (doc.select_first(panel)?, doc.select_first(button)?) {
                dropdowns.push(Dropdown { kind, panel, button });
            }
        }

        let shell = Shell {
            sidebar: doc.select_first(".sidebar")?,
            toggles: doc.select_all(".sidebar-toggle, #sidebarToggle")?,
            dropdowns,
        };
        shell.sync_toggles(doc);
        Ok(shell)
    }

    //----- Sidebar

    pub fn is_sidebar_open(&self, doc: &Document) -> bool {
        self.sidebar.map(|s| doc.has_class(s, "active")).unwrap_or(false)
    }

    pub fn set_sidebar(&self, doc: &mut Document, open: bool) {
        if let Some(sidebar) = self.sidebar {
            doc.set_class(sidebar, "active", open);
        }
        if let Some(body) = doc.body() {
            doc.set_class(body, "sidebar-open", open);
        }
        self.sync_toggles(doc);
    }

    pub fn toggle_sidebar(&self, doc: &mut Document) {
        let open = !self.is_sidebar_open(doc);
        self.set_sidebar(doc, open);
    }

    fn sync_toggles(&self, doc: &mut Document) {
        let expanded = if self.is_sidebar_open(doc) { "true" } else { "false" };
        for toggle in &self.toggles {
            doc.set_attr(*toggle, "aria-expanded", expanded);
        }
    }

    pub fn resize(&self, doc: &mut Document, width: u32) {
        if width >= SIDEBAR_BREAKPOINT && self.is_sidebar_open(doc) {
            self.set_sidebar(doc, false);
        }
    }

    //----- Dropdowns

    pub fn open_dropdown(&self, doc: &Document) -> Option<DropdownKind> {
        self.dropdowns.iter()
            .find(|d| doc.has_class(d.panel, "active"))
            .map(|d| d.kind)
    }

    /// Opens a dropdown, closing any other one. Toggling the open dropdown closes it.
    pub fn toggle_dropdown(&self, doc: &mut Document, kind: DropdownKind) -> Result<()> {
        let dropdown = match self.dropdowns.iter().find(|d| d.kind == kind) {
            Some(dropdown) => *dropdown,
            None => return Ok(()),
        };
        let was_open = doc.has_class(dropdown.panel, "active");
        self.close_all_dropdowns(doc);
        if !was_open {
            doc.add_class(dropdown.panel, "active");
            doc.set_attr(dropdown.button, "aria-expanded", "true");
            if kind == DropdownKind::Notifications {
                self.mark_notifications_read(doc)?;
            }
        }
        Ok(())
    }

    pub fn close_all_dropdowns(&self, doc: &mut Document) {
        for dropdown in &self.dropdowns {
            doc.remove_class(dropdown.panel, "active");
            doc.set_attr(dropdown.button, "aria-expanded", "false");
        }
    }

    fn mark_notifications_read(&self, doc: &mut Document) -> Result<()> {
        if let Some(badge) = doc.select_first(".notification-badge")? {
            doc.set_style(badge, "display", "none");
        }
        Ok(())
    }

    //----- Clicks

    /// Handles a click that wasn't consumed by a more specific component.
    pub fn click(&self, doc: &mut Document, target: NodeId, viewport_width: u32) -> Result<()> {
        // Dropdown buttons don't propagate the click any further
        if let Some(dropdown) = self.dropdowns.iter().find(|d| doc.contains(d.button, target)) {
            return self.toggle_dropdown(doc, dropdown.kind);
        }

        let on_toggle = self.toggles.iter().any(|t| doc.contains(*t, target));
        if on_toggle {
            self.toggle_sidebar(doc);
        } else if viewport_width < SIDEBAR_BREAKPOINT && self.is_sidebar_open(doc) {
            let in_sidebar = self.sidebar.map(|s| doc.contains(s, target)).unwrap_or(false);
            if !in_sidebar {
                self.set_sidebar(doc, false);
            }
        }

        // Clicks inside the open panel keep it open
        let in_open_panel = self.dropdowns.iter()
            .any(|d| doc.has_class(d.panel, "active") && doc.contains(d.panel, target));
        if !in_open_panel {
            self.close_all_dropdowns(doc);
        }
        Ok(())
    }
}
