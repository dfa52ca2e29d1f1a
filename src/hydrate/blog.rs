use anyhow::Result;
use itertools::Itertools;
use log::debug;

use crate::content::BlogPost;
use crate::dom::{escape_html, Document};
use super::Hydrate;

impl Hydrate for BlogPost {
    const PARAM: &'static str = "id";

    fn hydrate(&self, doc: &mut Document) -> Result<()> {
        doc.set_title(&format!("{} | PipelinePro Blog", self.title))?;

        if let Some(meta) = doc.select_first(r#"meta[name="description"]"#)? {
            doc.set_attr(meta, "content", &self.title);
        }

        // Badges: the container is whatever holds the primary badge in the hero
        let badge_container = doc.select_first(".hero .badge-primary")?.and_then(|b| doc.parent(b));
        if let Some(container) = badge_container {
            let mut badges = format!(r#"<span class="badge badge-primary">{}</span>"#, escape_html(&self.badge));
            if self.featured {
                badges.push_str(r#"<span class="badge badge-secondary">Featured</span>"#);
            }
            doc.set_inner_html(container, &badges);
        }

        if let Some(title) = doc.select_first(".hero h1")? {
            doc.set_text(title, &self.title);
        }

        if let Some(meta) = doc.select_first(".blog-meta")? {
            doc.set_inner_html(meta, &format!(
                "<span>{}</span> <span>•</span> <span>{}</span> <span>•</span> <span>By {}</span>",
                escape_html(&self.date),
                escape_html(&self.read_time),
                escape_html(&self.author),
            ));
        }

        if let Some(img) = doc.select_first("article img")? {
            doc.set_attr(img, "src", &self.image);
            doc.set_attr(img, "alt", &self.title);
        }

        if let Some(body) = doc.select_first("article .post-content")? {
            doc.set_inner_html(body, &self.content);
        }

        if let Some(tag_list) = find_tag_list(doc)? {
            let tags = self.tags.iter()
                .map(|tag| format!(r#"<span class="badge badge-primary">{}</span>"#, escape_html(tag)))
                .join(" ");
            doc.set_inner_html(tag_list, &tags);
        }

        // Author card in the sidebar
        let author_card = doc.select_first("aside .card img")?.and_then(|img| doc.parent(img));
        if let Some(card) = author_card {
            if let Some(img) = doc.select_first_within(card, "img")? {
                doc.set_attr(img, "src", &self.author_image);
                doc.set_attr(img, "alt", &self.author);
            }
            if let Some(name) = doc.select_first_within(card, "h3")? {
                doc.set_text(name, &self.author);
            }
            if let Some(role) = doc.select_first_within(card, "p:nth-child(3)")? {
                doc.set_text(role, &self.author_role);
            }
        } else {
            debug!("No author card in template");
        }

        Ok(())
    }
}

/// The tag list is the first `<div>` next to the "Tags" heading.
fn find_tag_list(doc: &Document) -> Result<Option<ego_tree::NodeId>> {
    for h3 in doc.select_all("h3")? {
        if doc.clean_text(h3).to_uppercase() == "TAGS" {
            if let Some(section) = doc.parent(h3) {
                return doc.select_first_within(section, "div");
            }
        }
    }
    Ok(None)
}
