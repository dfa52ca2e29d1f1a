//! Table row actions: approve, view, edit and delete.
//!
//! Actions read the row through the table model and only change the page. Nothing is sent or
//! stored anywhere.

use anyhow::Result;
use ego_tree::NodeId;
use itertools::Itertools;
use log::debug;

use crate::dom::escape_html;
use super::modal::{Intent, ModalOptions};
use super::toast::ToastKind;
use super::{Dashboard, Deferred};

/// Duration of the fade-out before a deleted row is removed.
pub const ROW_FADE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Approve,
    View,
    Edit,
    Delete,
}

impl RowAction {
    pub fn parse(value: &str) -> Option<RowAction> {
        match value {
            "approve" => Some(RowAction::Approve),
            "view" => Some(RowAction::View),
            "edit" => Some(RowAction::Edit),
            "delete" => Some(RowAction::Delete),
            _ => None,
        }
    }
}

impl Dashboard {
    /// Finds the (table, row) indexes of the row containing `node`.
    pub fn locate_row(&self, node: NodeId) -> Result<Option<(usize, usize)>> {
        let tr = match self.doc.closest(node, "tr")? {
            Some(tr) => tr,
            None => return Ok(None),
        };
        Ok(self.tables.iter().enumerate()
            .find_map(|(t, table)| table.row_index(tr).map(|r| (t, r))))
    }

    pub fn row_action(&mut self, table: usize, row: usize, action: RowAction, button: NodeId) -> Result<()> {
        if self.doc.has_attr(button, "disabled") {
            return Ok(());
        }
        // Rows being deleted are only waiting for their fade-out to end
        let fading = self.tables.get(table)
            .and_then(|t| t.rows.get(row))
            .map(|r| self.doc.has_class(r.node, "fade-out"))
            .unwrap_or(false);
        if fading {
            debug!("Ignoring {:?} on a row being deleted", action);
            return Ok(());
        }
        debug!("Row action {:?} on table #{} row #{}", action, table, row);
        match action {
            RowAction::Approve => self.approve(table, row, button),
            RowAction::View => self.view(table, row),
            RowAction::Edit => self.edit(table, row),
            RowAction::Delete => self.delete(table, row),
        }
    }

    fn approve(&mut self, table: usize, row: usize, button: NodeId) -> Result<()> {
        let data_table = match self.tables.get_mut(table) {
            Some(t) => t,
            None => return Ok(()),
        };
        if let Some(cell) = data_table.status_cell(row) {
            data_table.set_badge(&mut self.doc, row, cell, "Approved", "success");
        }
        self.doc.set_attr(button, "disabled", "");
        self.toast("Item approved successfully", ToastKind::Success);
        Ok(())
    }

    fn view(&mut self, table: usize, row: usize) -> Result<()> {
        let record = match self.tables.get(table) {
            Some(t) => t.record(row),
            None => return Ok(()),
        };
        let body = format!(
            r#"<dl class="detail-list">{}</dl>"#,
            record.iter()
                .map(|(label, value)| format!(
                    r#"<div class="detail-row"><dt>{}</dt><dd>{}</dd></div>"#,
                    escape_html(label), escape_html(value)
                ))
                .join("")
        );
        self.open_modal("Record Details", &body, ModalOptions::default())
    }

    fn edit(&mut self, table: usize, row: usize) -> Result<()> {
        let record = match self.tables.get(table) {
            Some(t) => t.record(row),
            None => return Ok(()),
        };
        let body = format!(
            r#"<form class="modal-form">{}</form>"#,
            record.iter().enumerate()
                .map(|(i, (label, value))| format!(
                    r#"<div class="form-group"><label class="form-label" for="edit-field-{i}">{label}</label><input class="form-input" id="edit-field-{i}" type="text" value="{value}"></div>"#,
                    i = i, label = escape_html(label), value = escape_html(value)
                ))
                .join("")
        );

        self.open_modal("Edit Record", &body, ModalOptions {
            confirm_label: "Save Changes".to_string(),
            intent: Intent::Primary,
            on_confirm: Some(Box::new(|dash: &mut Dashboard| {
                dash.toast("Changes saved successfully", ToastKind::Success);
                Ok(())
            })),
        })
    }

    fn delete(&mut self, table: usize, row: usize) -> Result<()> {
        let row_node = match self.tables.get(table).and_then(|t| t.rows.get(row)) {
            Some(r) => r.node,
            None => return Ok(()),
        };

        self.open_modal(
            "Delete Record",
            "<p>Are you sure you want to delete this record? This action cannot be undone.</p>",
            ModalOptions {
                confirm_label: "Delete".to_string(),
                intent: Intent::Destructive,
                on_confirm: Some(Box::new(move |dash: &mut Dashboard| {
                    if dash.doc.has_class(row_node, "fade-out") {
                        return Ok(());
                    }
                    dash.doc.add_class(row_node, "fade-out");
                    dash.timers.set_timeout(ROW_FADE_MS, Deferred::RemoveRow { table, row: row_node });
                    dash.toast("Record deleted successfully", ToastKind::Success);
                    Ok(())
                })),
            },
        )
    }
}
