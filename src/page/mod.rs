//! Behaviours shared by every page of the site: theme and direction preferences, navigation,
//! role-based presentation, reveal animations, counters, form validation, in-page scrolling and
//! keyboard accessibility.
//!
//! A `Page` owns the document and the storage it was created with. Browser events are turned
//! into method calls, and timers are driven explicitly through `advance`.

use anyhow::Result;
use ego_tree::NodeId;
use log::debug;

use crate::dom::Document;
use crate::storage::Storage;
use crate::timers::Timers;

pub mod a11y;
pub mod effects;
pub mod forms;
pub mod nav;
pub mod role;
pub mod theme;

use effects::Counter;
use forms::{FieldError, FormValidator};
use nav::{AnchorScroll, NavigationController};
use role::RoleView;
use theme::{DirectionController, ThemeController};

/// What the page knows about the browser it runs in.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Path of the current location, used to highlight navigation links
    pub path: String,
    pub prefers_dark: bool,
    pub scroll_y: u32,
    /// Without observer support, reveal and counter animations start immediately
    pub intersection_observer: bool,
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            path: "/".to_string(),
            prefers_dark: false,
            scroll_y: 0,
            intersection_observer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageTask {
    CounterFrame { counter: usize, started_at: u64 },
    RemoveAlert(NodeId),
}

pub struct Page<S: Storage> {
    pub doc: Document,
    pub storage: S,
    env: Environment,
    pub theme: ThemeController,
    pub direction: DirectionController,
    pub nav: NavigationController,
    pub role: RoleView,
    forms: FormValidator,
    counters: Vec<Counter>,
    started_counters: Vec<bool>,
    timers: Timers<PageTask>,
    /// Fragments pushed to the location history by in-page links
    history: Vec<String>,
    scroll_request: Option<AnchorScroll>,
    focused: Option<NodeId>,
}

impl<S: Storage> Page<S> {
    /// Initializes all page behaviours, in the order the page script does.
    pub fn load(mut doc: Document, storage: S, env: Environment) -> Result<Self> {
        let theme = ThemeController::init(&mut doc, &storage, env.prefers_dark)?;
        let direction = DirectionController::init(&mut doc, &storage);
        let nav = NavigationController::init(&mut doc, &env.path, env.scroll_y)?;
        let role = RoleView::load(&storage);
        role.apply(&mut doc)?;

        effects::show_skeletons(&mut doc)?;
        let counters = effects::counters(&doc)?;

        let mut page = Page {
            doc,
            storage,
            theme,
            direction,
            nav,
            role,
            forms: FormValidator,
            started_counters: vec![false; counters.len()],
            counters,
            timers: Timers::new(),
            history: Vec::new(),
            scroll_request: None,
            focused: None,
            env,
        };

        if !page.env.intersection_observer {
            effects::reveal_all(&mut page.doc)?;
            for i in 0..page.counters.len() {
                page.start_counter(i);
            }
        }

        debug!("Page initialized");
        Ok(page)
    }

    pub fn into_parts(self) -> (Document, S) {
        (self.doc, self.storage)
    }

    //----- Events

    pub fn click(&mut self, target: NodeId) -> Result<()> {
        if self.doc.closest(target, ".theme-toggle")?.is_some() {
            self.theme.toggle(&mut self.doc, &mut self.storage)?;
        } else if self.doc.closest(target, "#rtlToggle")?.is_some() {
            self.direction.toggle(&mut self.doc, &mut self.storage);
        }
        self.nav.click(&mut self.doc, target)?;

        if let Some(scroll) = nav::anchor_scroll(&self.doc, target)? {
            debug!("Scrolling to {}", scroll.hash);
            self.history.push(scroll.hash.clone());
            self.scroll_request = Some(scroll);
        }
        if let Some(focus) = a11y::follow_skip_link(&mut self.doc, target)? {
            self.focused = Some(focus);
        }
        Ok(())
    }

    pub fn mouse_down(&mut self) {
        a11y::mouse_down(&mut self.doc);
    }

    pub fn key_down(&mut self, key: &str) {
        a11y::key_down(&mut self.doc, key);
    }

    /// The last smooth scroll started by an in-page link.
    pub fn scroll_request(&self) -> Option<&AnchorScroll> {
        self.scroll_request.as_ref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn scroll(&mut self, scroll_y: u32) {
        self.env.scroll_y = scroll_y;
        self.nav.handle_scroll(&mut self.doc, scroll_y);
    }

    /// An element entered the viewport.
    pub fn intersect(&mut self, target: NodeId) {
        effects::reveal(&mut self.doc, target);
        if let Some(i) = self.counters.iter().position(|c| c.node == target) {
            self.start_counter(i);
        }
    }

    /// The window `load` event.
    pub fn loaded(&mut self) -> Result<()> {
        effects::hide_skeletons(&mut self.doc)
    }

    pub fn os_theme_changed(&mut self, prefers_dark: bool) -> Result<()> {
        self.env.prefers_dark = prefers_dark;
        self.theme.os_preference_changed(&mut self.doc, &self.storage, prefers_dark)
    }

    pub fn blur(&mut self, field: NodeId) -> Result<bool> {
        self.forms.validate_field(&mut self.doc, field)
    }

    pub fn input(&mut self, field: NodeId, value: &str) -> Result<()> {
        self.forms.input(&mut self.doc, field, value)
    }

    pub fn submit(&mut self, form: NodeId) -> Result<Vec<FieldError>> {
        match self.forms.submit(&mut self.doc, form)? {
            Ok(alert) => {
                self.timers.set_timeout(forms::SUCCESS_ALERT_MS, PageTask::RemoveAlert(alert));
                Ok(Vec::new())
            }
            Err(errors) => Ok(errors),
        }
    }

    //----- Timers

    fn start_counter(&mut self, i: usize) {
        if self.started_counters[i] {
            return;
        }
        self.started_counters[i] = true;
        let started_at = self.timers.now();
        self.timers.set_timeout(0, PageTask::CounterFrame { counter: i, started_at });
    }

    /// Lets `ms` milliseconds pass, running the tasks that become due.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timers.now() + ms;
        while let Some(task) = self.timers.pop_due(until) {
            match task {
                PageTask::CounterFrame { counter, started_at } => {
                    let elapsed = self.timers.now() - started_at;
                    if let Some(c) = self.counters.get(counter) {
                        if !c.render(&mut self.doc, elapsed) {
                            self.timers.set_timeout(effects::FRAME_MS, PageTask::CounterFrame { counter, started_at });
                        }
                    }
                }
                PageTask::RemoveAlert(alert) => self.doc.detach(alert),
            }
        }
        self.timers.advance_to(until);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::{MemoryStorage, THEME_KEY};

    const PAGE: &str = r#"<html><head></head><body>
        <header class="header"><button class="theme-toggle"><span class="sun-icon">S</span></button>
        <button id="rtlToggle">RTL</button></header>
        <p class="reveal">Hello</p>
        <span id="count" data-counter="250" data-duration="100">0</span>
        <form data-validate><div><input id="email" type="email" value="jane@example.com"></div></form>
        </body></html>"#;

    #[test]
    fn test_theme_round_trip() -> Result<()> {
        let mut page = Page::load(Document::parse(PAGE), MemoryStorage::new(), Environment::default())?;
        let root = page.doc.root();
        let toggle = page.doc.select_first(".sun-icon")?.unwrap();

        page.click(toggle)?;
        assert_eq!(Some("dark"), page.doc.attr(root, "data-theme"));
        page.click(toggle)?;
        assert_eq!(Some("light"), page.doc.attr(root, "data-theme"));
        assert_eq!(Some("light".to_string()), page.storage.get_item(THEME_KEY));
        Ok(())
    }

    #[test]
    fn test_counters_without_observer() -> Result<()> {
        let env = Environment { intersection_observer: false, ..Environment::default() };
        let mut page = Page::load(Document::parse(PAGE), MemoryStorage::new(), env)?;
        assert_eq!(1, page.doc.select_all(".reveal.active")?.len());

        let count = page.doc.select_first("#count")?.unwrap();
        page.advance(50);
        let midway = page.doc.text(count).parse::<i64>()?;
        assert!(midway > 125 && midway < 250);

        page.advance(100);
        assert_eq!("250", page.doc.text(count));
        Ok(())
    }

    #[test]
    fn test_success_alert_is_removed() -> Result<()> {
        let mut page = Page::load(Document::parse(PAGE), MemoryStorage::new(), Environment::default())?;
        let form = page.doc.select_first("form")?.unwrap();

        assert!(page.submit(form)?.is_empty());
        assert_eq!(1, page.doc.select_all(".alert-success")?.len());
        page.advance(4999);
        assert_eq!(1, page.doc.select_all(".alert-success")?.len());
        page.advance(1);
        assert!(page.doc.select_all(".alert-success")?.is_empty());
        Ok(())
    }
}
