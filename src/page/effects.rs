//! Presentation effects: reveal animations, animated counters, skeleton loaders and button
//! loading state.

use anyhow::Result;
use ego_tree::NodeId;

use crate::dom::Document;

pub const DEFAULT_COUNTER_DURATION: u64 = 2000;

/// Interval between two counter animation frames.
pub const FRAME_MS: u64 = 16;

//----- Reveal

pub fn reveal_targets(doc: &Document) -> Result<Vec<NodeId>> {
    doc.select_all(".reveal")
}

/// Activates a reveal element once it enters the viewport.
pub fn reveal(doc: &mut Document, id: NodeId) {
    if doc.has_class(id, "reveal") {
        doc.add_class(id, "active");
    }
}

pub fn reveal_all(doc: &mut Document) -> Result<()> {
    for id in reveal_targets(doc)? {
        doc.add_class(id, "active");
    }
    Ok(())
}

//----- Counters

/// An element whose number is animated from `start` to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub node: NodeId,
    pub start: i64,
    pub target: i64,
    pub duration: u64,
    pub prefix: String,
    pub suffix: String,
}

impl Counter {
    /// A plain number going from `start` to `target`, without prefix nor suffix.
    pub fn between(node: NodeId, start: i64, target: i64, duration: u64) -> Counter {
        Counter { node, start, target, duration, prefix: String::new(), suffix: String::new() }
    }

    /// A `[data-counter]` element, counting up from zero.
    pub fn from_element(doc: &Document, node: NodeId) -> Option<Counter> {
        let target = doc.attr(node, "data-counter")?.trim().parse::<i64>().ok()?;
        let duration = doc.attr(node, "data-duration")
            .and_then(|d| d.trim().parse::<u64>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_COUNTER_DURATION);

        Some(Counter {
            node,
            start: 0,
            target,
            duration,
            prefix: doc.attr(node, "data-prefix").unwrap_or_default().to_string(),
            suffix: doc.attr(node, "data-suffix").unwrap_or_default().to_string(),
        })
    }

    /// Value displayed `elapsed` ms after the animation started (ease-out cubic).
    pub fn value_at(&self, elapsed: u64) -> i64 {
        let progress = if self.duration == 0 { 1.0 } else { (elapsed as f64 / self.duration as f64).min(1.0) };
        if progress >= 1.0 {
            return self.target;
        }
        let eased = 1.0 - (1.0 - progress).powi(3);
        (self.start as f64 + eased * (self.target - self.start) as f64).floor() as i64
    }

    /// Renders the frame for `elapsed` and returns true once the final value is shown.
    pub fn render(&self, doc: &mut Document, elapsed: u64) -> bool {
        let text = format!("{}{}{}", self.prefix, format_thousands(self.value_at(elapsed)), self.suffix);
        doc.set_text(self.node, &text);
        elapsed >= self.duration
    }
}

pub fn counters(doc: &Document) -> Result<Vec<Counter>> {
    Ok(doc.select_all("[data-counter]")?
        .into_iter()
        .filter_map(|id| Counter::from_element(doc, id))
        .collect())
}

/// Formats an integer with comma thousands separators, like `toLocaleString()` in `en-US`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        result.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

//----- Skeletons

pub fn show_skeletons(doc: &mut Document) -> Result<()> {
    for id in doc.select_all("[data-skeleton]")? {
        doc.add_class(id, "skeleton");
    }
    Ok(())
}

pub fn hide_skeletons(doc: &mut Document) -> Result<()> {
    for id in doc.select_all(".skeleton")? {
        doc.remove_class(id, "skeleton");
    }
    Ok(())
}

//----- Buttons

pub fn set_button_loading(doc: &mut Document, button: NodeId, loading: bool) {
    if loading {
        let text = doc.text(button);
        doc.set_attr(button, "disabled", "");
        doc.set_attr(button, "data-original-text", &text);
        doc.set_inner_html(button, r#"<span class="animate-spin">⟳</span> Loading..."#);
    } else {
        doc.remove_attr(button, "disabled");
        let text = doc.attr(button, "data-original-text")
            .map(str::to_string)
            .unwrap_or_else(|| doc.text(button));
        doc.set_text(button, &text);
    }
}
