use anyhow::Result;
use ego_tree::NodeId;
use log::debug;

use crate::dom::Document;

/// Scroll offset past which the header gets the `scrolled` class.
pub const SCROLL_THRESHOLD: u32 = 50;

/// Height of the fixed header, kept clear above anchor targets.
pub const HEADER_OFFSET: u32 = 80;

/// A smooth scroll to the target of an in-page link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorScroll {
    pub target: NodeId,
    /// Fragment pushed to the history, e.g. `#main`
    pub hash: String,
    /// Distance kept between the top of the viewport and the target
    pub offset: u32,
}

/// Resolves a click on an `a[href^="#"]` link. A bare `#`, or a fragment that doesn't designate
/// an element, is left to the browser.
pub fn anchor_scroll(doc: &Document, target: NodeId) -> Result<Option<AnchorScroll>> {
    let link = match doc.closest(target, r##"a[href^="#"]"##)? {
        Some(link) => link,
        None => return Ok(None),
    };
    let href = doc.attr(link, "href").unwrap_or_default();
    if href == "#" {
        return Ok(None);
    }

    let element = match doc.select_first(href) {
        Ok(element) => element,
        Err(e) => {
            debug!("Not an element fragment {:?}: {}", href, e);
            None
        }
    };
    Ok(element.map(|element| AnchorScroll { target: element, hash: href.to_string(), offset: HEADER_OFFSET }))
}

/// Header, mobile menu and active link state.
#[derive(Debug)]
pub struct NavigationController {
    header: Option<NodeId>,
    mobile_nav: Option<NodeId>,
    menu_toggle: Option<NodeId>,
}

impl NavigationController {
    pub fn init(doc: &mut Document, path: &str, scroll_y: u32) -> Result<Self> {
        let controller = NavigationController {
            header: doc.select_first(".header")?,
            mobile_nav: doc.select_first(".mobile-nav")?,
            menu_toggle: doc.select_first(".menu-toggle")?,
        };
        controller.highlight_active_link(doc, path)?;
        controller.handle_scroll(doc, scroll_y);
        Ok(controller)
    }

    pub fn is_menu_open(&self, doc: &Document) -> bool {
        self.mobile_nav.map(|nav| doc.has_class(nav, "active")).unwrap_or(false)
    }

    pub fn toggle_mobile_menu(&self, doc: &mut Document) {
        if let Some(toggle) = self.menu_toggle {
            doc.toggle_class(toggle, "active");
        }
        if let Some(nav) = self.mobile_nav {
            doc.toggle_class(nav, "active");
        }
        if let Some(body) = doc.body() {
            doc.toggle_class(body, "menu-open");
        }
    }

    pub fn close_mobile_menu(&self, doc: &mut Document) {
        if let Some(toggle) = self.menu_toggle {
            doc.remove_class(toggle, "active");
        }
        if let Some(nav) = self.mobile_nav {
            doc.remove_class(nav, "active");
        }
        if let Some(body) = doc.body() {
            doc.remove_class(body, "menu-open");
        }
    }

    /// Handles a click anywhere in the page. Returns true if the click was consumed.
    pub fn click(&self, doc: &mut Document, target: NodeId) -> Result<bool> {
        let on_toggle = self.menu_toggle.map(|t| doc.contains(t, target)).unwrap_or(false);
        if on_toggle && self.mobile_nav.is_some() {
            self.toggle_mobile_menu(doc);
            return Ok(true);
        }

        if doc.closest(target, ".mobile-nav-link")?.is_some() {
            self.close_mobile_menu(doc);
            return Ok(true);
        }

        // Outside click
        if let Some(nav) = self.mobile_nav {
            if self.is_menu_open(doc) && !doc.contains(nav, target) && !on_toggle {
                self.close_mobile_menu(doc);
            }
        }
        Ok(false)
    }

    pub fn handle_scroll(&self, doc: &mut Document, scroll_y: u32) {
        if let Some(header) = self.header {
            doc.set_class(header, "scrolled", scroll_y > SCROLL_THRESHOLD);
        }
    }

    /// Marks links pointing to the current page as `active`.
    pub fn highlight_active_link(&self, doc: &mut Document, path: &str) -> Result<()> {
        for link in doc.select_all(".nav-link, .mobile-nav-link")? {
            let link_path = match doc.attr(link, "href") {
                Some(href) => link_path(href),
                None => continue,
            };
            let active = path == link_path || path.ends_with(&link_path);
            doc.set_class(link, "active", active);
        }
        Ok(())
    }
}

/// Path part of an href, resolved against the site root.
fn link_path(href: &str) -> String {
    let base = url::Url::parse("http://localhost/").ok();
    match base.and_then(|base| base.join(href).ok()) {
        Some(url) => url.path().to_string(),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <header class="header">
          <a class="nav-link" href="index.html">Home</a>
          <a class="nav-link" href="blog.html?x=1">Blog</a>
          <button class="menu-toggle"><span id="bars"></span></button>
        </header>
        <div class="mobile-nav"><a class="mobile-nav-link" href="blog.html">Blog</a></div>
        <p id="outside">text</p>
        </body></html>"#;

    #[test]
    fn test_active_link_and_scroll() -> Result<()> {
        let mut doc = Document::parse(PAGE);
        let nav = NavigationController::init(&mut doc, "/site/blog.html", 0)?;

        let active = doc.select_all(".active")?;
        assert_eq!(2, active.len());
        let header = doc.select_first(".header")?.unwrap();
        assert!(!doc.has_class(header, "scrolled"));

        nav.handle_scroll(&mut doc, 51);
        assert!(doc.has_class(header, "scrolled"));
        nav.handle_scroll(&mut doc, 50);
        assert!(!doc.has_class(header, "scrolled"));
        Ok(())
    }

    #[test]
    fn test_mobile_menu() -> Result<()> {
        let mut doc = Document::parse(PAGE);
        let nav = NavigationController::init(&mut doc, "/", 0)?;
        let bars = doc.select_first("#bars")?.unwrap();
        let outside = doc.select_first("#outside")?.unwrap();
        let body = doc.body().unwrap();

        assert!(nav.click(&mut doc, bars)?);
        assert!(nav.is_menu_open(&doc));
        assert!(doc.has_class(body, "menu-open"));

        nav.click(&mut doc, outside)?;
        assert!(!nav.is_menu_open(&doc));
        assert!(!doc.has_class(body, "menu-open"));

        nav.click(&mut doc, bars)?;
        let link = doc.select_first(".mobile-nav-link")?.unwrap();
        nav.click(&mut doc, link)?;
        assert!(!nav.is_menu_open(&doc));
        Ok(())
    }

    #[test]
    fn test_anchor_links() -> Result<()> {
        let doc = Document::parse(r##"<html><body>
            <a id="top" href="#">Top</a>
            <a id="to-contact" href="#contact"><span id="label">Contact</span></a>
            <a id="nowhere" href="#missing">Missing</a>
            <a id="page" href="contact.html#form">Page</a>
            <section id="contact"></section>
            </body></html>"##);
        let find = |css: &str| doc.select_first(css).unwrap().unwrap();

        let scroll = anchor_scroll(&doc, find("#label"))?.unwrap();
        assert_eq!(find("section"), scroll.target);
        assert_eq!("#contact", scroll.hash);
        assert_eq!(HEADER_OFFSET, scroll.offset);

        assert_eq!(None, anchor_scroll(&doc, find("#top"))?);
        assert_eq!(None, anchor_scroll(&doc, find("#nowhere"))?);
        assert_eq!(None, anchor_scroll(&doc, find("#page"))?);
        Ok(())
    }
}
