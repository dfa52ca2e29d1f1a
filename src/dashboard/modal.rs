//! The dashboard's single modal dialog.

use anyhow::{anyhow, Result};
use ego_tree::NodeId;
use indoc::indoc;

use crate::dom::Document;
use super::Dashboard;

/// Action run when the user confirms the modal. It's consumed by the confirmation.
pub type ConfirmFn = Box<dyn FnOnce(&mut Dashboard) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    Primary,
    Destructive,
}

pub struct ModalOptions {
    pub confirm_label: String,
    pub intent: Intent,
    /// Without a callback the modal is read-only and has no confirm button
    pub on_confirm: Option<ConfirmFn>,
}

impl Default for ModalOptions {
    fn default() -> Self {
        ModalOptions {
            confirm_label: "Confirm".to_string(),
            intent: Intent::Primary,
            on_confirm: None,
        }
    }
}

const MODAL_HTML: &str = indoc! {r#"
    <div class="modal-overlay" id="dashboardModal">
        <div class="modal" role="dialog" aria-modal="true" aria-labelledby="dashboardModalTitle">
            <div class="modal-header">
                <h3 class="modal-title" id="dashboardModalTitle"></h3>
                <button type="button" class="modal-close" aria-label="Close">×</button>
            </div>
            <div class="modal-body"></div>
            <div class="modal-footer">
                <button type="button" class="btn btn-outline modal-cancel">Cancel</button>
                <button type="button" class="btn btn-primary modal-confirm">Confirm</button>
            </div>
        </div>
    </div>"#};

#[derive(Debug, Clone, Copy)]
struct Parts {
    overlay: NodeId,
    title: NodeId,
    body: NodeId,
    confirm: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalClick {
    Confirm,
    Dismiss,
    Inside,
    Outside,
}

#[derive(Default)]
pub struct Modal {
    parts: Option<Parts>,
    on_confirm: Option<ConfirmFn>,
}

impl Modal {
    /// Creates the overlay on first use, then reuses it.
    fn ensure(&mut self, doc: &mut Document) -> Result<Parts> {
        if let Some(parts) = self.parts {
            return Ok(parts);
        }
        let body = doc.body().ok_or_else(|| anyhow!("Document has no <body>"))?;
        let overlay = doc.append_html(body, MODAL_HTML)
            .into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create modal"))?;

        let find = |css: &str| -> Result<NodeId> {
            doc.select_first_within(overlay, css)?.ok_or_else(|| anyhow!("Modal has no '{}'", css))
        };
        let parts = Parts {
            overlay,
            title: find(".modal-title")?,
            body: find(".modal-body")?,
            confirm: find(".modal-confirm")?,
        };
        self.parts = Some(parts);
        Ok(parts)
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.parts.map(|p| p.overlay)
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        self.parts.map(|p| doc.has_class(p.overlay, "active")).unwrap_or(false)
    }

    /// Opens the modal. Any callback from a previous opening is dropped.
    pub fn open(&mut self, doc: &mut Document, title: &str, body_html: &str, options: ModalOptions) -> Result<()> {
        let parts = self.ensure(doc)?;

        doc.set_text(parts.title, title);
        doc.set_inner_html(parts.body, body_html);

        doc.set_text(parts.confirm, &options.confirm_label);
        let destructive = options.intent == Intent::Destructive;
        doc.set_class(parts.confirm, "btn-danger", destructive);
        doc.set_class(parts.confirm, "btn-primary", !destructive);
        if options.on_confirm.is_some() {
            doc.remove_attr(parts.confirm, "hidden");
        } else {
            doc.set_attr(parts.confirm, "hidden", "");
        }

        self.on_confirm = options.on_confirm;
        doc.add_class(parts.overlay, "active");
        if let Some(body) = doc.body() {
            doc.add_class(body, "modal-open");
        }
        Ok(())
    }

    pub fn close(&mut self, doc: &mut Document) {
        self.on_confirm = None;
        if let Some(parts) = self.parts {
            doc.remove_class(parts.overlay, "active");
        }
        if let Some(body) = doc.body() {
            doc.remove_class(body, "modal-open");
        }
    }

    /// Closes the modal and hands back its callback, if any.
    pub fn take_confirm(&mut self, doc: &mut Document) -> Option<ConfirmFn> {
        let callback = self.on_confirm.take();
        self.close(doc);
        callback
    }

    /// Classifies a click while the modal is open.
    pub fn classify(&self, doc: &Document, target: NodeId) -> Result<ModalClick> {
        let parts = match self.parts {
            Some(parts) => parts,
            None => return Ok(ModalClick::Outside),
        };
        if doc.contains(parts.confirm, target) {
            return Ok(ModalClick::Confirm);
        }
        if doc.closest(target, ".modal-close, .modal-cancel")?.is_some() || target == parts.overlay {
            return Ok(ModalClick::Dismiss);
        }
        if doc.contains(parts.overlay, target) {
            return Ok(ModalClick::Inside);
        }
        Ok(ModalClick::Outside)
    }

    /// The body element, for reading back fields of an edit form.
    pub fn body(&self) -> Option<NodeId> {
        self.parts.map(|p| p.body)
    }
}
