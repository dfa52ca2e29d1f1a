//! Keyboard and pointer accessibility helpers.
//!
//! The body carries `using-mouse` while the user navigates with a pointer, so that focus rings
//! are only drawn for keyboard users.

use anyhow::Result;
use ego_tree::NodeId;
use log::debug;

use crate::dom::Document;

pub const USING_MOUSE_CLASS: &str = "using-mouse";

pub fn mouse_down(doc: &mut Document) {
    if let Some(body) = doc.body() {
        doc.add_class(body, USING_MOUSE_CLASS);
    }
}

pub fn key_down(doc: &mut Document, key: &str) {
    if key != "Tab" {
        return;
    }
    if let Some(body) = doc.body() {
        doc.remove_class(body, USING_MOUSE_CLASS);
    }
}

/// Handles a click on a `.skip-link`: its target is made focusable and returned, to be focused.
pub fn follow_skip_link(doc: &mut Document, target: NodeId) -> Result<Option<NodeId>> {
    let link = match doc.closest(target, ".skip-link")? {
        Some(link) => link,
        None => return Ok(None),
    };
    let href = match doc.attr(link, "href") {
        Some(href) if href.len() > 1 => href.to_string(),
        _ => return Ok(None),
    };

    let main = match doc.select_first(&href) {
        Ok(Some(main)) => main,
        Ok(None) => return Ok(None),
        Err(e) => {
            debug!("Skip link to {:?} ignored: {}", href, e);
            return Ok(None);
        }
    };
    doc.set_attr(main, "tabindex", "-1");
    Ok(Some(main))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pointer_and_keyboard() {
        let mut doc = Document::parse("<html><body><p>Hi</p></body></html>");
        let body = doc.body().unwrap();

        mouse_down(&mut doc);
        assert!(doc.has_class(body, USING_MOUSE_CLASS));
        key_down(&mut doc, "Enter");
        assert!(doc.has_class(body, USING_MOUSE_CLASS));
        key_down(&mut doc, "Tab");
        assert!(!doc.has_class(body, USING_MOUSE_CLASS));
    }

    #[test]
    fn test_skip_link() -> Result<()> {
        let mut doc = Document::parse(r##"<html><body>
            <a class="skip-link" href="#content">Skip</a>
            <a id="other" href="#content">Other</a>
            <div id="content"></div>
            </body></html>"##);
        let skip = doc.select_first(".skip-link")?.unwrap();
        let other = doc.select_first("#other")?.unwrap();
        let content = doc.select_first("#content")?.unwrap();

        assert_eq!(None, follow_skip_link(&mut doc, other)?);
        assert!(!doc.has_attr(content, "tabindex"));

        assert_eq!(Some(content), follow_skip_link(&mut doc, skip)?);
        assert_eq!(Some("-1"), doc.attr(content, "tabindex"));
        Ok(())
    }
}
