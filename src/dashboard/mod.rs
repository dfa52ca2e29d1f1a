//! The admin and client dashboard pages.
//!
//! A `Dashboard` owns its document and reacts to `Event`s: clicks are routed to the modal, the
//! row actions, the sortable headers and finally the shell (sidebar and dropdowns). Delayed work
//! such as toast transitions and row removal goes through a virtual clock.

use anyhow::Result;
use ego_tree::NodeId;
use log::{debug, info};

use crate::dom::Document;
use crate::page::effects::{Counter, FRAME_MS};
use crate::page::forms::set_field_value;
use crate::timers::{TimerId, Timers};

pub mod actions;
pub mod charts;
pub mod live;
pub mod modal;
pub mod shell;
pub mod table;
pub mod toast;
pub mod upload;

use actions::RowAction;
use charts::ChartRenderer;
use live::LiveStats;
use modal::{Modal, ModalOptions};
use shell::Shell;
use table::DataTable;
use toast::ToastKind;
use upload::{UploadOutcome, UploadedFile};

/// Resize events are handled once the window stops resizing for this long.
pub const RESIZE_DEBOUNCE_MS: u64 = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Click(NodeId),
    Resize(u32),
    /// Typing in an input or picking an option in a select
    Input { target: NodeId, value: String },
}

/// Work scheduled on the dashboard's clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    ShowToast(NodeId),
    HideToast(NodeId),
    RemoveToast(NodeId),
    RemoveRow { table: usize, row: NodeId },
    Resize(u32),
    LiveUpdate,
    /// A frame of a statistic moving to its new value
    StatFrame { counter: Counter, started_at: u64 },
}

pub struct Dashboard {
    pub doc: Document,
    viewport_width: u32,
    pub shell: Shell,
    modal: Modal,
    pub tables: Vec<DataTable>,
    timers: Timers<Deferred>,
    pending_resize: Option<TimerId>,
    live: Option<LiveStats>,
}

impl Dashboard {
    pub fn load(mut doc: Document, viewport_width: u32) -> Result<Dashboard> {
        let shell = Shell::bind(&mut doc)?;
        let tables = DataTable::bind_all(&mut doc)?;
        info!("Dashboard initialized with {} table(s)", tables.len());

        Ok(Dashboard {
            doc,
            viewport_width,
            shell,
            modal: Modal::default(),
            tables,
            timers: Timers::new(),
            pending_resize: None,
            live: None,
        })
    }

    pub fn init_charts(&mut self, renderer: Option<&mut dyn ChartRenderer>) -> Result<Vec<&'static str>> {
        charts::init_charts(&mut self.doc, renderer)
    }

    /// Starts the periodic statistics updates.
    pub fn start_live_stats(&mut self, live: LiveStats) {
        if self.live.is_none() {
            self.timers.set_timeout(live::UPDATE_INTERVAL_MS, Deferred::LiveUpdate);
        }
        self.live = Some(live);
    }

    pub fn table(&self, id: &str) -> Option<&DataTable> {
        self.tables.iter().find(|t| t.id.as_deref() == Some(id))
    }

    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    //----- Events

    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Click(target) => self.click(target),
            Event::Resize(width) => {
                self.viewport_width = width;
                if let Some(id) = self.pending_resize.take() {
                    self.timers.cancel(id);
                }
                self.pending_resize = Some(self.timers.set_timeout(RESIZE_DEBOUNCE_MS, Deferred::Resize(width)));
                Ok(())
            }
            Event::Input { target, value } => self.input(target, &value),
        }
    }

    fn click(&mut self, target: NodeId) -> Result<()> {
        if self.modal.is_open(&self.doc) {
            match self.modal.classify(&self.doc, target)? {
                modal::ModalClick::Confirm => {
                    if let Some(callback) = self.modal.take_confirm(&mut self.doc) {
                        callback(self)?;
                    }
                }
                modal::ModalClick::Dismiss => self.modal.close(&mut self.doc),
                // The overlay covers the page
                modal::ModalClick::Inside | modal::ModalClick::Outside => {}
            }
            return Ok(());
        }

        // Row actions and sorting don't stop the click: it still reaches the shell, which closes
        // dropdowns and the small screen sidebar.
        if let Some(button) = self.doc.closest(target, "[data-action]")? {
            let action = self.doc.attr(button, "data-action").and_then(RowAction::parse);
            if let (Some(action), Some((table, row))) = (action, self.locate_row(button)?) {
                self.row_action(table, row, action, button)?;
            }
        } else if let Some(th) = self.doc.closest(target, "th[data-sort]")? {
            if let Some(table) = self.tables.iter_mut().find(|t| t.column_of(th).is_some()) {
                if let Some(column) = table.column_of(th) {
                    table.toggle_sort(&mut self.doc, column);
                }
            }
        }

        self.shell.click(&mut self.doc, target, self.viewport_width)
    }

    fn input(&mut self, target: NodeId, value: &str) -> Result<()> {
        set_field_value(&mut self.doc, target, value);

        let table_id = self.doc.attr(target, "data-search-table")
            .or_else(|| self.doc.attr(target, "data-filter-table"))
            .map(str::to_string);

        if let Some(table_id) = table_id {
            match self.tables.iter().find(|t| t.id.as_deref() == Some(table_id.as_str())) {
                Some(table) => {
                    table.filter(&mut self.doc, value);
                }
                None => debug!("No table with id '{}'", table_id),
            }
        }
        Ok(())
    }

    //----- Modal & toasts

    pub fn open_modal(&mut self, title: &str, body_html: &str, options: ModalOptions) -> Result<()> {
        self.modal.open(&mut self.doc, title, body_html, options)
    }

    pub fn close_modal(&mut self) {
        self.modal.close(&mut self.doc)
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal.is_open(&self.doc)
    }

    pub fn modal_overlay(&self) -> Option<NodeId> {
        self.modal.overlay()
    }

    pub fn toast(&mut self, message: &str, kind: ToastKind) -> Option<NodeId> {
        toast::show_toast(&mut self.doc, &mut self.timers, message, kind)
    }

    //----- Avatar

    pub fn upload_avatar(&mut self, file: &UploadedFile) -> Result<UploadOutcome> {
        match upload::validate(file) {
            Err(rejection) => {
                self.toast(&rejection.to_string(), ToastKind::Error);
                Ok(UploadOutcome::Rejected(rejection))
            }
            Ok(media_type) => {
                let data_url = upload::data_url(&media_type, &file.bytes);
                for img in self.doc.select_all("[data-avatar-preview]")? {
                    self.doc.set_attr(img, "src", &data_url);
                }
                self.toast("Profile picture updated successfully", ToastKind::Success);
                Ok(UploadOutcome::Accepted { media_type, data_url })
            }
        }
    }

    //----- Time

    /// Lets `ms` milliseconds pass, running the tasks that become due.
    pub fn advance(&mut self, ms: u64) -> Result<()> {
        let until = self.timers.now() + ms;
        while let Some(task) = self.timers.pop_due(until) {
            match task {
                Deferred::RemoveRow { table, row } => {
                    if let Some(t) = self.tables.get_mut(table) {
                        t.remove_row(&mut self.doc, row);
                    }
                }
                Deferred::Resize(width) => {
                    self.pending_resize = None;
                    self.shell.resize(&mut self.doc, width);
                }
                Deferred::LiveUpdate => {
                    if let Some(live) = self.live.as_mut() {
                        if let Some(counter) = live.tick(&self.doc)? {
                            let started_at = self.timers.now();
                            self.timers.set_timeout(0, Deferred::StatFrame { counter, started_at });
                        }
                    }
                    self.timers.set_timeout(live::UPDATE_INTERVAL_MS, Deferred::LiveUpdate);
                }
                Deferred::StatFrame { counter, started_at } => {
                    let elapsed = self.timers.now() - started_at;
                    if !counter.render(&mut self.doc, elapsed) {
                        self.timers.set_timeout(FRAME_MS, Deferred::StatFrame { counter, started_at });
                    }
                }
                toast_task => toast::run(&mut self.doc, &mut self.timers, &toast_task),
            }
        }
        self.timers.advance_to(until);
        Ok(())
    }
}
