use anyhow::Result;
use indoc::formatdoc;
use itertools::Itertools;

use crate::content::ServiceDetail;
use crate::dom::{escape_html, Document};
use super::Hydrate;

pub const FEATURES_TITLE: &str = "Service Features";
pub const FEATURES_DESCRIPTION: &str = "Advanced methodologies to ensure the highest standards of pipeline integrity.";

const CHECK_ICON: &str = r#"<svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="var(--color-success)" stroke-width="2"><path d="M22 11.08V12a10 10 0 1 1-5.93-9.14"/><polyline points="22 4 12 14.01 9 11.01"/></svg>"#;

const TICK_ICON: &str = r#"<svg width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polyline points="20 6 9 17 4 12"/></svg>"#;

impl Hydrate for ServiceDetail {
    const PARAM: &'static str = "service";

    fn hydrate(&self, doc: &mut Document) -> Result<()> {
        doc.set_title(&format!("{} | PipelinePro", self.title))?;

        if let Some(meta) = doc.select_first(r#"meta[name="description"]"#)? {
            doc.set_attr(meta, "content", &self.description);
        }

        //----- Hero

        if let Some(title) = doc.select_first(".hero-title")? {
            doc.set_text(title, &self.title);
        }
        if let Some(desc) = doc.select_first(".hero-description")? {
            doc.set_text(desc, &self.description);
        }

        //----- Overview

        if let Some(title) = doc.select_first(".about .section-title")? {
            doc.set_text(title, &self.overview_title);
        }
        let paragraphs = doc.select_all(".about-content > p")?;
        for (p, text) in paragraphs.into_iter().zip(self.overview.iter()) {
            doc.set_text(p, text);
        }
        if let Some(img) = doc.select_first(".about-image img")? {
            doc.set_attr(img, "src", &self.hero_image);
            doc.set_attr(img, "alt", &self.title);
        }

        if let Some(grid) = doc.select_first(".benefits-grid")? {
            let items = self.benefits.iter()
                .map(|benefit| format!(
                    r#"<div class="benefit-item">{}<span>{}</span></div>"#,
                    CHECK_ICON, escape_html(benefit)
                ))
                .join("");
            doc.set_inner_html(grid, &items);
        }

        //----- Technologies

        if let Some(section) = doc.select_first(".features-section")? {
            if let Some(title) = doc.select_first_within(section, ".section-title")? {
                doc.set_text(title, FEATURES_TITLE);
            }
            if let Some(desc) = doc.select_first_within(section, ".section-description")? {
                doc.set_text(desc, FEATURES_DESCRIPTION);
            }
            if let Some(grid) = doc.select_first_within(section, ".services-grid")? {
                let cards = self.technologies.iter()
                    .map(|tech| formatdoc! {r#"
                        <article class="card reveal active">
                            <div class="card-body">
                                <div class="card-icon">{icon}</div>
                                <h3>{title}</h3>
                                <p>{description}</p>
                            </div>
                        </article>"#,
                        // Icons are authored markup
                        icon = tech.icon,
                        title = escape_html(&tech.title),
                        description = escape_html(&tech.description),
                    })
                    .join("\n");
                doc.set_inner_html(grid, &cards);
            }
        }

        //----- Capabilities

        if let Some(section) = doc.select_first(".capabilities-section")? {
            if let (Some(title), Some(text)) = (doc.select_first_within(section, ".section-title")?, &self.capabilities_title) {
                doc.set_text(title, text);
            }
        }
        if let Some(grid) = doc.select_first(".features-grid")? {
            let items = self.capabilities.iter()
                .map(|cap| formatdoc! {r#"
                    <div class="feature-item reveal active">
                        <div class="feature-icon">{icon}</div>
                        <div class="feature-content">
                            <h3>{title}</h3>
                            <p>{description}</p>
                        </div>
                    </div>"#,
                    icon = TICK_ICON,
                    title = escape_html(&cap.title),
                    description = escape_html(&cap.description),
                })
                .join("\n");
            doc.set_inner_html(grid, &items);
        }

        Ok(())
    }
}
