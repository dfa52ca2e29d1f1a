//! Static generation of the detail pages.
//!
//! Every registry record is rendered into a copy of its template. Pages are generated in
//! parallel, and a file is only rewritten when its content changes, so that running the build
//! twice leaves the output untouched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;

use crate::config::{Config, Section};
use crate::content::{Keyed, Registry, BLOG_DATA, SERVICES_DATA};
use crate::dom::Document;
use crate::hydrate::Hydrate;
use crate::page::{Environment, Page};
use crate::storage::Storage;

pub const BLOG_TEMPLATE: &str = "blog-details.html";
pub const SERVICE_TEMPLATE: &str = "service-details.html";

#[derive(Debug, Default)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

impl BuildReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}

impl Section {
    pub fn template(&self) -> &'static str {
        match self {
            Section::Blog => BLOG_TEMPLATE,
            Section::Services => SERVICE_TEMPLATE,
        }
    }

    /// Output sub-directory
    pub fn dir(&self) -> &'static str {
        match self {
            Section::Blog => "blog",
            Section::Services => "services",
        }
    }
}

pub fn read_template(config: &Config, name: &str) -> Result<String> {
    let path = config.template_dir.join(name);
    fs::read_to_string(&path).with_context(|| format!("Failed to read template {:?}", path))
}

/// Renders a record into its template.
pub fn render_page<T: Hydrate>(template: &str, record: &T) -> Result<String> {
    let mut doc = Document::parse(template);
    record.hydrate(&mut doc)
        .with_context(|| format!("Failed to hydrate '{}'", record.slug()))?;
    doc.to_html()
}

/// Writes `content` unless the file already has it. Returns true if the file was written.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(true)
}

fn build_section<T: Hydrate + Sync>(config: &Config, section: Section, registry: &Registry<T>) -> Result<BuildReport> {
    let template = read_template(config, section.template())?;
    let out_dir = config.output_dir.join(section.dir());

    let results = registry.iter().collect::<Vec<_>>()
        .into_par_iter()
        .map(|record| {
            let path = out_dir.join(format!("{}.html", record.slug()));
            let html = render_page(&template, record)?;
            let written = write_if_changed(&path, &html)?;
            if written {
                info!("Writing {:?}", path);
            } else {
                debug!("Unchanged {:?}", path);
            }
            Ok((path, written))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = BuildReport::default();
    for (path, written) in results {
        if written {
            report.written.push(path);
        } else {
            report.unchanged.push(path);
        }
    }
    Ok(report)
}

/// Generates the detail pages of all sections, or of only one of them.
pub fn build(config: &Config, only: Option<Section>) -> Result<BuildReport> {
    info!("Building {} pages into {:?}", config.site_name, config.output_dir);

    let sections = match only {
        Some(section) => vec![section],
        None => vec![Section::Blog, Section::Services],
    };

    let mut report = BuildReport::default();
    for section in sections {
        let section_report = match section {
            Section::Blog => build_section(config, section, &BLOG_DATA)?,
            Section::Services => build_section(config, section, &SERVICES_DATA)?,
        };
        report.written.extend(section_report.written);
        report.unchanged.extend(section_report.unchanged);
    }

    info!("{} page(s) written, {} unchanged", report.written.len(), report.unchanged.len());
    Ok(report)
}

/// Runs the page behaviours on a document with the given preferences, as a browser would on
/// load, and returns the resulting document and storage.
pub fn apply_preferences<S: Storage>(doc: Document, storage: S, path: &str) -> Result<(Document, S)> {
    let env = Environment {
        path: path.to_string(),
        // Nothing is observed when rendering offline, show everything
        intersection_observer: false,
        ..Environment::default()
    };
    let mut page = Page::load(doc, storage, env)?;
    page.loaded()?;
    Ok(page.into_parts())
}
