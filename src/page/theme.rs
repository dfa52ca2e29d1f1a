//! Theme and text direction preferences.

use std::fmt;

use anyhow::Result;
use log::debug;

use crate::dom::Document;
use crate::storage::{Storage, DIRECTION_KEY, THEME_KEY};

/// A two-state user preference persisted in storage.
pub trait Preference: Copy + Eq + fmt::Debug {
    const KEY: &'static str;

    fn parse(value: &str) -> Option<Self>;
    fn as_str(&self) -> &'static str;
    fn toggled(self) -> Self;

    /// The stored value, if any. Unknown values are treated as absent.
    fn load(storage: &dyn Storage) -> Option<Self> {
        let value = storage.get_item(Self::KEY)?;
        let result = Self::parse(&value);
        if result.is_none() {
            debug!("Ignoring unknown value {:?} for '{}'", value, Self::KEY);
        }
        result
    }

    fn store(&self, storage: &mut dyn Storage) {
        storage.set_item(Self::KEY, self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Preference for Theme {
    const KEY: &'static str = THEME_KEY;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Preference for Direction {
    const KEY: &'static str = DIRECTION_KEY;

    fn parse(value: &str) -> Option<Self> {
        match value {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    fn toggled(self) -> Self {
        match self {
            Direction::Ltr => Direction::Rtl,
            Direction::Rtl => Direction::Ltr,
        }
    }
}

//----- Theme

pub type ThemeListener = Box<dyn FnMut(Theme) + Send>;

/// Applies the color theme to the document and keeps the toggle buttons in sync.
pub struct ThemeController {
    current: Theme,
    listeners: Vec<ThemeListener>,
}

impl ThemeController {
    /// Resolves the initial theme (stored value, then OS preference, then light) and applies it.
    pub fn init(doc: &mut Document, storage: &dyn Storage, prefers_dark: bool) -> Result<Self> {
        let current = match Theme::load(storage) {
            Some(theme) => theme,
            None if prefers_dark => Theme::Dark,
            None => Theme::Light,
        };
        let mut controller = ThemeController { current, listeners: Vec::new() };
        controller.apply(doc, current)?;
        Ok(controller)
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Registers a `themechange` listener.
    pub fn subscribe(&mut self, listener: ThemeListener) {
        self.listeners.push(listener);
    }

    pub fn apply(&mut self, doc: &mut Document, theme: Theme) -> Result<()> {
        self.current = theme;
        let root = doc.root();
        doc.set_attr(root, "data-theme", theme.as_str());

        let label = match theme {
            Theme::Dark => "Switch to light mode",
            Theme::Light => "Switch to dark mode",
        };
        for btn in doc.select_all(".theme-toggle")? {
            doc.set_attr(btn, "aria-label", label);
            doc.set_attr(btn, "title", label);
        }

        let (sun, moon) = match theme {
            Theme::Light => ("inline-block", "none"),
            Theme::Dark => ("none", "inline-block"),
        };
        for icon in doc.select_all(".sun-icon")? {
            doc.set_style(icon, "display", sun);
        }
        for icon in doc.select_all(".moon-icon")? {
            doc.set_style(icon, "display", moon);
        }

        for listener in &mut self.listeners {
            listener(theme);
        }
        Ok(())
    }

    pub fn toggle(&mut self, doc: &mut Document, storage: &mut dyn Storage) -> Result<Theme> {
        let theme = self.current.toggled();
        self.apply(doc, theme)?;
        theme.store(storage);
        Ok(theme)
    }

    /// Follows an OS color scheme change, unless the user picked a theme explicitly.
    pub fn os_preference_changed(&mut self, doc: &mut Document, storage: &dyn Storage, prefers_dark: bool) -> Result<()> {
        if storage.get_item(THEME_KEY).is_none() {
            self.apply(doc, if prefers_dark { Theme::Dark } else { Theme::Light })?;
        }
        Ok(())
    }
}

//----- Direction

/// Text direction, independent from the theme.
#[derive(Debug, Default)]
pub struct DirectionController;

impl DirectionController {
    /// Restores the stored direction, if any. Without one the `dir` attribute is left alone.
    pub fn init(doc: &mut Document, storage: &dyn Storage) -> Self {
        if let Some(dir) = Direction::load(storage) {
            let root = doc.root();
            doc.set_attr(root, "dir", dir.as_str());
        }
        DirectionController
    }

    pub fn current(&self, doc: &Document) -> Direction {
        doc.attr(doc.root(), "dir")
            .and_then(Direction::parse)
            .unwrap_or(Direction::Ltr)
    }

    pub fn toggle(&mut self, doc: &mut Document, storage: &mut dyn Storage) -> Direction {
        let dir = self.current(doc).toggled();
        let root = doc.root();
        doc.set_attr(root, "dir", dir.as_str());
        dir.store(storage);
        dir
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::storage::MemoryStorage;

    const PAGE: &str = r#"<html><head></head><body>
        <button class="theme-toggle"><span class="sun-icon">S</span><span class="moon-icon">M</span></button>
        </body></html>"#;

    #[test]
    fn test_theme_precedence() -> Result<()> {
        let mut doc = Document::parse(PAGE);
        let storage = MemoryStorage::new().with(THEME_KEY, "light");
        let theme = ThemeController::init(&mut doc, &storage, true)?;
        assert_eq!(Theme::Light, theme.current());

        let theme = ThemeController::init(&mut doc, &MemoryStorage::new(), true)?;
        assert_eq!(Theme::Dark, theme.current());

        // Garbage is ignored
        let storage = MemoryStorage::new().with(THEME_KEY, "blue");
        let theme = ThemeController::init(&mut doc, &storage, false)?;
        assert_eq!(Theme::Light, theme.current());
        Ok(())
    }

    #[test]
    fn test_apply_updates_toggles_and_icons() -> Result<()> {
        let mut doc = Document::parse(PAGE);
        let mut storage = MemoryStorage::new();
        let mut theme = ThemeController::init(&mut doc, &storage, false)?;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        theme.subscribe(Box::new(move |t| seen2.lock().unwrap().push(t)));

        assert_eq!(Theme::Dark, theme.toggle(&mut doc, &mut storage)?);

        let btn = doc.select_first(".theme-toggle")?.unwrap();
        assert_eq!(Some("Switch to light mode"), doc.attr(btn, "aria-label"));
        assert_eq!(Some("Switch to light mode"), doc.attr(btn, "title"));
        let sun = doc.select_first(".sun-icon")?.unwrap();
        let moon = doc.select_first(".moon-icon")?.unwrap();
        assert_eq!(Some("none".to_string()), doc.style(sun, "display"));
        assert_eq!(Some("inline-block".to_string()), doc.style(moon, "display"));
        assert_eq!(Some("dark".to_string()), storage.get_item(THEME_KEY));

        assert_eq!(vec![Theme::Dark], *seen.lock().unwrap());
        Ok(())
    }

    #[test]
    fn test_os_preference_only_applies_without_stored_theme() -> Result<()> {
        let mut doc = Document::parse(PAGE);
        let mut storage = MemoryStorage::new();
        let mut theme = ThemeController::init(&mut doc, &storage, false)?;

        theme.os_preference_changed(&mut doc, &storage, true)?;
        assert_eq!(Theme::Dark, theme.current());

        storage.set_item(THEME_KEY, "dark");
        theme.os_preference_changed(&mut doc, &storage, false)?;
        assert_eq!(Theme::Dark, theme.current());
        assert_eq!(Some("dark"), doc.attr(doc.root(), "data-theme"));
        Ok(())
    }

    #[test]
    fn test_direction_is_independent() -> Result<()> {
        let mut doc = Document::parse(PAGE);
        let mut storage = MemoryStorage::new();
        let mut theme = ThemeController::init(&mut doc, &storage, false)?;
        let mut dir = DirectionController::init(&mut doc, &storage);
        assert_eq!(None, doc.attr(doc.root(), "dir"));

        assert_eq!(Direction::Rtl, dir.toggle(&mut doc, &mut storage));
        assert_eq!(Some("rtl"), doc.attr(doc.root(), "dir"));
        assert_eq!(Theme::Light, theme.current());

        theme.toggle(&mut doc, &mut storage)?;
        assert_eq!(Direction::Rtl, dir.current(&doc));

        // Restored on the next load
        let mut doc2 = Document::parse(PAGE);
        DirectionController::init(&mut doc2, &storage);
        assert_eq!(Some("rtl"), doc2.attr(doc2.root(), "dir"));
        Ok(())
    }
}
