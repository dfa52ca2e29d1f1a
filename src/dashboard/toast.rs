use ego_tree::NodeId;
use log::debug;

use crate::dom::{escape_html, Document};
use crate::timers::Timers;
use super::Deferred;

pub const SHOW_DELAY_MS: u64 = 10;
pub const VISIBLE_MS: u64 = 3000;
pub const FADE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }
}

/// Appends a notification toast to the body and schedules its show/hide transitions.
pub fn show_toast(doc: &mut Document, timers: &mut Timers<Deferred>, message: &str, kind: ToastKind) -> Option<NodeId> {
    let body = doc.body()?;
    let html = format!(
        r#"<div class="alert alert-{} notification-toast" role="status">{}</div>"#,
        kind.as_str(), escape_html(message)
    );
    let toast = doc.append_html(body, &html).into_iter().next()?;
    debug!("Toast ({}): {}", kind.as_str(), message);

    timers.set_timeout(SHOW_DELAY_MS, Deferred::ShowToast(toast));
    timers.set_timeout(VISIBLE_MS, Deferred::HideToast(toast));
    Some(toast)
}

/// Runs a toast transition. Hiding schedules the removal once the fade-out is done.
pub fn run(doc: &mut Document, timers: &mut Timers<Deferred>, task: &Deferred) {
    match *task {
        Deferred::ShowToast(toast) => doc.add_class(toast, "show"),
        Deferred::HideToast(toast) => {
            doc.remove_class(toast, "show");
            timers.set_timeout(FADE_MS, Deferred::RemoveToast(toast));
        }
        Deferred::RemoveToast(toast) => doc.detach(toast),
        _ => {}
    }
}
