//! Static content registries: hand-authored records looked up by slug.
//!
//! Records are authored in YAML under `data/` and embedded in the binary. They are parsed once,
//! on first access, and never mutated afterwards.

use std::collections::HashMap;

use anyhow::bail;
use lazy_static::lazy_static;

mod blog;
mod services;

pub use blog::BlogPost;
pub use services::{Capability, ServiceDetail, Technology};

/// A record that can be stored in a registry.
pub trait Keyed {
    fn slug(&self) -> &str;
    fn title(&self) -> &str;
}

/// Slug to record mapping that remembers the authoring order.
#[derive(Debug)]
pub struct Registry<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed + serde::de::DeserializeOwned> Registry<T> {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let entries: Vec<T> = serde_yaml::from_str(yaml)?;
        Self::new(entries)
    }
}

impl<T: Keyed> Registry<T> {
    pub fn new(entries: Vec<T>) -> anyhow::Result<Self> {
        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if entry.slug().is_empty() {
                bail!("Entry #{} has an empty slug", i);
            }
            if index.insert(entry.slug().to_string(), i).is_some() {
                bail!("Duplicate slug '{}'", entry.slug());
            }
        }
        Ok(Registry { entries, index })
    }

    pub fn get(&self, slug: &str) -> Option<&T> {
        self.index.get(slug).map(|i| &self.entries[*i])
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.slug())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    pub static ref BLOG_DATA: Registry<BlogPost> =
        Registry::from_yaml(include_str!("../../data/blog.yml")).unwrap();

    pub static ref SERVICES_DATA: Registry<ServiceDetail> =
        Registry::from_yaml(include_str!("../../data/services.yml")).unwrap();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_embedded_registries() {
        assert_eq!(7, BLOG_DATA.len());
        assert_eq!(6, SERVICES_DATA.len());

        assert_eq!(Some("future-smart-pigging"), BLOG_DATA.slugs().next());
        assert!(SERVICES_DATA.contains("ili"));
        assert!(!BLOG_DATA.contains("does-not-exist"));
    }

    #[test]
    fn test_duplicate_slugs_are_rejected() {
        let yaml = indoc::indoc! {"
            - slug: ili
              title: One
              description: d
              hero_image: i
              overview_title: t
              overview: [a, b]
              benefits: []
              technologies: []
              capabilities: []
            - slug: ili
              title: Two
              description: d
              hero_image: i
              overview_title: t
              overview: [a, b]
              benefits: []
              technologies: []
              capabilities: []
        "};
        let err = Registry::<ServiceDetail>::from_yaml(yaml).unwrap_err();
        assert_eq!("Duplicate slug 'ili'", err.to_string());
    }
}
