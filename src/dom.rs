//! A mutable HTML document.
//!
//! This is the "DOM root" every controller and hydrator works on. It wraps a `scraper::Html`
//! (an `ego_tree` of html5ever nodes) and exposes the handful of operations a page script
//! needs: CSS queries, text/attribute/class mutation, inner HTML replacement and a stable
//! serialization.
//!
//! Nodes are addressed by their `NodeId`. Ids stay valid for the lifetime of the document, even
//! once a node is detached: a detached node simply stops matching queries.

use std::fmt::Write as FmtWrite;
use std::io;

use anyhow::{anyhow, Result};
use ego_tree::{NodeId, NodeMut, NodeRef};
use html5ever::serialize::{AttrRef, HtmlSerializer, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use itertools::Itertools;
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};

pub struct Document {
    html: Html,
}

/// Builds a `QualName` with no prefix nor namespace
fn qname(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))
}

impl Document {
    pub fn parse(html: &str) -> Document {
        Document {
            html: Html::parse_document(html),
        }
    }

    /// The `<html>` element.
    pub fn root(&self) -> NodeId {
        self.html.root_element().id()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.select_first("body").ok().flatten()
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    //----- Queries

    pub fn select_all(&self, css: &str) -> Result<Vec<NodeId>> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).map(|elt| elt.id()).collect())
    }

    pub fn select_first(&self, css: &str) -> Result<Option<NodeId>> {
        let sel = selector(css)?;
        Ok(self.html.select(&sel).next().map(|elt| elt.id()))
    }

    /// Descendants of `scope` matching `css`. The scope itself is never returned.
    pub fn select_within(&self, scope: NodeId, css: &str) -> Result<Vec<NodeId>> {
        let sel = selector(css)?;
        Ok(match self.element(scope) {
            Some(elt) => elt.select(&sel).map(|e| e.id()).filter(|id| *id != scope).collect(),
            None => Vec::new(),
        })
    }

    pub fn select_first_within(&self, scope: NodeId, css: &str) -> Result<Option<NodeId>> {
        Ok(self.select_within(scope, css)?.into_iter().next())
    }

    pub fn matches(&self, id: NodeId, css: &str) -> Result<bool> {
        let sel = selector(css)?;
        Ok(self.element(id).map(|elt| sel.matches(&elt)).unwrap_or(false))
    }

    /// The node itself or its nearest ancestor element matching `css`.
    pub fn closest(&self, id: NodeId, css: &str) -> Result<Option<NodeId>> {
        let sel = selector(css)?;
        let node = match self.html.tree.get(id) {
            Some(node) => node,
            None => return Ok(None),
        };
        let found = std::iter::once(node)
            .chain(node.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|elt| sel.matches(elt))
            .map(|elt| elt.id());
        Ok(found)
    }

    /// Is `node` equal to `ancestor` or one of its descendants?
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        match self.html.tree.get(node) {
            Some(n) => n.id() == ancestor || n.ancestors().any(|a| a.id() == ancestor),
            None => false,
        }
    }

    /// Is the node still reachable from the document root?
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.html.tree.root().id(), id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.html.tree.get(id)
            .and_then(|n| n.parent())
            .filter(|p| p.value().is_element())
            .map(|p| p.id())
    }

    /// Element children, in document order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.html.tree.get(id) {
            Some(n) => n.children().filter(|c| c.value().is_element()).map(|c| c.id()).collect(),
            None => Vec::new(),
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|elt| elt.value().name())
    }

    //----- Text

    /// Concatenated text of all descendant text nodes (`textContent`).
    pub fn text(&self, id: NodeId) -> String {
        match self.html.tree.get(id) {
            Some(node) => match node.value() {
                Node::Text(text) => text.text.to_string(),
                _ => ElementRef::wrap(node).map(|elt| elt.text().collect()).unwrap_or_default(),
            },
            None => String::new(),
        }
    }

    /// Text with runs of whitespace collapsed to a single space and trimmed.
    pub fn clean_text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.text(id))
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.append(Node::Text(Text { text: text.into() }));
        }
    }

    //----- Attributes

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|elt| elt.value().attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.update_attrs(id, |attrs| {
            if let Some(attr) = attrs.iter_mut().find(|a| &*a.name.local == name) {
                attr.value = value.into();
            } else {
                attrs.push(Attribute { name: qname(name), value: value.into() });
            }
        });
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if self.has_attr(id, name) {
            self.update_attrs(id, |attrs| attrs.retain(|a| &*a.name.local != name));
        }
    }

    // scraper caches the id and classes of an element when it's built, and selectors match on
    // those caches. Mutating `attrs` in place would leave them stale, so the element is rebuilt.
    fn update_attrs(&mut self, id: NodeId, f: impl FnOnce(&mut Vec<Attribute>)) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            if let Node::Element(elt) = node.value() {
                let mut attrs = elt.attrs.iter()
                    .map(|(name, value)| Attribute { name: name.clone(), value: value.clone() })
                    .collect::<Vec<_>>();
                f(&mut attrs);
                *elt = Element::new(elt.name.clone(), attrs);
            }
        }
    }

    //----- Classes

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) && self.element(id).is_some() {
            let mut classes = self.classes(id).join(" ");
            if !classes.is_empty() {
                classes.push(' ');
            }
            classes.push_str(class);
            self.set_attr(id, "class", &classes);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            let classes = self.classes(id).into_iter().filter(|c| *c != class).collect::<Vec<_>>().join(" ");
            self.set_attr(id, "class", &classes);
        }
    }

    /// Returns whether the class is present after toggling.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    pub fn set_class(&mut self, id: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(id, class)
        } else {
            self.remove_class(id, class)
        }
    }

    //----- Inline style

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.attr(id, "style").and_then(|style| {
            parse_style(style).into_iter()
                .find(|(name, _)| name == property)
                .map(|(_, value)| value)
        })
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let mut decls = self.attr(id, "style").map(parse_style).unwrap_or_default();
        match decls.iter_mut().find(|(name, _)| name == property) {
            Some(decl) => decl.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attr(id, "style", &format_style(&decls));
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        if let Some(style) = self.attr(id, "style") {
            let mut decls = parse_style(style);
            decls.retain(|(name, _)| name != property);
            if decls.is_empty() {
                self.remove_attr(id, "style");
            } else {
                self.set_attr(id, "style", &format_style(&decls));
            }
        }
    }

    //----- Structure

    fn clear_children(&mut self, id: NodeId) {
        let ids = match self.html.tree.get(id) {
            Some(node) => node.children().map(|c| c.id()).collect::<Vec<_>>(),
            None => return,
        };
        for child in ids {
            if let Some(mut node) = self.html.tree.get_mut(child) {
                node.detach();
            }
        }
    }

    /// Replace the children of a node with parsed HTML (`innerHTML = ...`).
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Vec<NodeId> {
        self.clear_children(id);
        self.append_html(id, html)
    }

    /// Parse `html` and append it to the children of `parent`. Returns the ids of the
    /// top-level elements that were added.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let context = self.tag_name(parent).unwrap_or("body").to_string();
        let fragment = parse_fragment_in(&context, html);

        let source = match fragment_container(&fragment, &context) {
            Some(node) => node,
            None => return Vec::new(),
        };

        let mut added = Vec::new();
        if let Some(mut dst) = self.html.tree.get_mut(parent) {
            for child in source.children() {
                let mut copied = dst.append(child.value().clone());
                copy_children(&mut copied, child);
                if child.value().is_element() {
                    added.push(copied.id());
                }
            }
        }
        added
    }

    /// Like `append_html`, but inserts before the existing children.
    pub fn prepend_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let existing = match self.html.tree.get(parent) {
            Some(node) => node.children().map(|c| c.id()).collect::<Vec<_>>(),
            None => return Vec::new(),
        };
        for id in &existing {
            if let Some(mut node) = self.html.tree.get_mut(*id) {
                node.detach();
            }
        }
        let added = self.append_html(parent, html);
        for id in existing {
            self.append_child(parent, id);
        }
        added
    }

    /// Moves `child` (attached or not) to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        if let Some(mut node) = self.html.tree.get_mut(child) {
            node.detach();
        }
        if let Some(mut node) = self.html.tree.get_mut(parent) {
            node.append_id(child);
        }
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    //----- Document-level helpers

    pub fn title(&self) -> Option<String> {
        self.select_first("title").ok().flatten().map(|id| self.text(id))
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        let id = match self.select_first("head title")? {
            Some(id) => id,
            None => {
                let head = self.select_first("head")?.ok_or_else(|| anyhow!("Document has no <head>"))?;
                self.append_html(head, "<title></title>")
                    .into_iter().next()
                    .ok_or_else(|| anyhow!("Cannot create <title>"))?
            }
        };
        self.set_text(id, title);
        Ok(())
    }

    /// Stable serialization of the children of a node.
    pub fn inner_html(&self, id: NodeId) -> Result<String> {
        let elt = self.element(id).ok_or_else(|| anyhow!("Node is not an element"))?;
        serialize(&elt, TraversalScope::ChildrenOnly(None))
    }

    /// Stable serialization of the node itself.
    pub fn outer_html(&self, id: NodeId) -> Result<String> {
        let elt = self.element(id).ok_or_else(|| anyhow!("Node is not an element"))?;
        serialize(&elt, TraversalScope::IncludeNode)
    }

    /// Stable serialization of the whole document, doctype included.
    pub fn to_html(&self) -> Result<String> {
        let mut html = String::new();
        let has_doctype = self.html.tree.root().children().any(|c| matches!(c.value(), Node::Doctype(_)));
        if has_doctype {
            html.push_str("<!DOCTYPE html>\n");
        }
        html.push_str(&serialize(&self.html.root_element(), TraversalScope::IncludeNode)?);
        Ok(html)
    }
}

//--------------------------------------------------------------------------------------------------
// Fragment parsing

// The HTML parser drops table parts that appear outside of a table, so fragments destined to
// table elements are parsed inside a matching wrapper.
fn parse_fragment_in(context: &str, html: &str) -> Html {
    match context {
        "tr" => Html::parse_fragment(&format!("<table><tbody><tr>{}</tr></tbody></table>", html)),
        "tbody" | "thead" | "tfoot" | "table" => Html::parse_fragment(&format!("<table><tbody>{}</tbody></table>", html)),
        _ => Html::parse_fragment(html),
    }
}

fn fragment_container<'a>(fragment: &'a Html, context: &str) -> Option<NodeRef<'a, Node>> {
    let wrapper = match context {
        "tr" => "tr",
        "tbody" | "thead" | "tfoot" | "table" => "tbody",
        _ => return Some(*fragment.root_element()),
    };
    let sel = Selector::parse(wrapper).ok()?;
    let found = fragment.select(&sel).next().map(|elt| *elt);
    found
}

fn copy_children(dst: &mut NodeMut<'_, Node>, src: NodeRef<'_, Node>) {
    for child in src.children() {
        let mut copied = dst.append(child.value().clone());
        copy_children(&mut copied, child);
    }
}

//--------------------------------------------------------------------------------------------------
// Inline style

fn parse_style(style: &str) -> Vec<(String, String)> {
    style.split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn format_style(decls: &[(String, String)]) -> String {
    decls.iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

//--------------------------------------------------------------------------------------------------
// Text helpers

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes text for inclusion in HTML content or a double-quoted attribute value.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    // Writing to a String can't fail
    let _ = write_escaped_fmt(&mut result, text);
    result
}

fn write_escaped_fmt(out: &mut impl FmtWrite, text: &str) -> std::fmt::Result {
    for c in text.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&quot;")?,
            '\'' => out.write_str("&#39;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Serialization

/// Serializer wrapper writing attributes in name order.
///
/// scraper keeps attributes in a hash map whose iteration order changes from one run to the next.
/// Generated pages must be byte-identical across builds, so attributes are written sorted by
/// namespace and local name.
struct SortedAttrs<S>(S);

impl<S: Serializer> Serializer for SortedAttrs<S> {
    fn start_elem<'a, AttrIter>(&mut self, name: QualName, attrs: AttrIter) -> io::Result<()>
    where
        AttrIter: Iterator<Item = AttrRef<'a>>,
    {
        let sorted = attrs
            .sorted_by(|(a, _), (b, _)| (&a.ns, &a.local).cmp(&(&b.ns, &b.local)));
        self.0.start_elem(name, sorted)
    }

    fn end_elem(&mut self, name: QualName) -> io::Result<()> {
        self.0.end_elem(name)
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.0.write_text(text)
    }

    fn write_comment(&mut self, text: &str) -> io::Result<()> {
        self.0.write_comment(text)
    }

    fn write_doctype(&mut self, name: &str) -> io::Result<()> {
        self.0.write_doctype(name)
    }

    fn write_processing_instruction(&mut self, target: &str, data: &str) -> io::Result<()> {
        self.0.write_processing_instruction(target, data)
    }
}

fn serialize(elt: &ElementRef, scope: TraversalScope) -> Result<String> {
    // The serializer only looks at the options' scope to name the implicit parent element,
    // which is the same for both scopes we use.
    let opts = SerializeOpts {
        scripting_enabled: false,
        traversal_scope: TraversalScope::IncludeNode,
        create_missing_parent: false,
    };

    let mut buf = Vec::new();
    let mut ser = SortedAttrs(HtmlSerializer::new(&mut buf, opts));
    elt.serialize(&mut ser, scope)?;

    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use indoc::indoc;

    const PAGE: &str = indoc! {r#"
        <!DOCTYPE html>
        <html><head><title>Placeholder</title></head>
        <body>
          <div class="hero"><h1 id="title" class="big">Hello</h1></div>
          <table><tbody id="rows"><tr><td>a</td></tr></tbody></table>
        </body></html>
    "#};

    #[test]
    fn test_class_changes_are_visible_to_selectors() {
        let mut doc = Document::parse(PAGE);
        let h1 = doc.select_first("h1").unwrap().unwrap();

        assert!(doc.select_first("h1.active").unwrap().is_none());
        doc.add_class(h1, "active");
        assert_eq!(Some(h1), doc.select_first("h1.active").unwrap());
        assert_eq!(vec!["big", "active"], doc.classes(h1));

        assert!(!doc.toggle_class(h1, "active"));
        assert!(doc.select_first(".active").unwrap().is_none());
    }

    #[test]
    fn test_text_and_title() {
        let mut doc = Document::parse(PAGE);
        let h1 = doc.select_first(".hero h1").unwrap().unwrap();
        doc.set_text(h1, "New <title>");
        assert_eq!("New <title>", doc.text(h1));
        assert!(doc.outer_html(h1).unwrap().contains("New &lt;title&gt;"));

        doc.set_title("Page | Site").unwrap();
        assert_eq!(Some("Page | Site".to_string()), doc.title());
    }

    #[test]
    fn test_inner_html_in_table_context() {
        let mut doc = Document::parse(PAGE);
        let tbody = doc.select_first("#rows").unwrap().unwrap();
        let added = doc.append_html(tbody, "<tr><td>b</td></tr>");
        assert_eq!(1, added.len());
        assert_eq!(2, doc.select_all("#rows tr").unwrap().len());

        let tr = added[0];
        doc.set_inner_html(tr, "<td>c</td><td>d</td>");
        assert_eq!(2, doc.select_within(tr, "td").unwrap().len());
    }

    #[test]
    fn test_style_and_attributes() {
        let mut doc = Document::parse(PAGE);
        let h1 = doc.select_first("h1").unwrap().unwrap();
        doc.set_style(h1, "display", "none");
        doc.set_style(h1, "opacity", "0");
        assert_eq!(Some("none".to_string()), doc.style(h1, "display"));
        doc.remove_style(h1, "display");
        assert_eq!(Some("opacity: 0;"), doc.attr(h1, "style"));
        doc.remove_style(h1, "opacity");
        assert!(!doc.has_attr(h1, "style"));
    }

    #[test]
    fn test_detach_and_closest() {
        let mut doc = Document::parse(PAGE);
        let h1 = doc.select_first("h1").unwrap().unwrap();
        let hero = doc.closest(h1, ".hero").unwrap().unwrap();
        assert!(doc.contains(hero, h1));

        doc.detach(hero);
        assert!(!doc.is_attached(h1));
        assert!(doc.select_first("h1").unwrap().is_none());
    }

    #[test]
    fn test_stable_serialization() {
        let mut doc = Document::parse(PAGE);
        let h1 = doc.select_first("h1").unwrap().unwrap();
        doc.set_attr(h1, "data-z", "1");
        doc.set_attr(h1, "aria-label", "x");

        let html = doc.to_html().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(html.contains(r#"<h1 aria-label="x" class="big" data-z="1" id="title">"#));
        assert_eq!(html, doc.to_html().unwrap());
    }

    #[test]
    fn test_escape() {
        assert_eq!("&lt;b&gt; &amp; &quot;q&quot;", escape_html("<b> & \"q\""));
    }
}
