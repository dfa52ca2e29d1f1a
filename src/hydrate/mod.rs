//! Page hydration: populate a static template's placeholder elements with a registry record.
//!
//! Hydration is a single pass over a fixed set of targets. A target that can't be found in the
//! template is skipped, and a slug that isn't in the registry leaves the template untouched.

use anyhow::Result;
use log::{debug, warn};

use crate::content::{Keyed, Registry};
use crate::dom::Document;

mod blog;
mod service;

pub use service::{FEATURES_DESCRIPTION, FEATURES_TITLE};

/// A record that knows how to write itself into its detail page template.
pub trait Hydrate: Keyed {
    /// Name of the query parameter carrying the slug
    const PARAM: &'static str;

    fn hydrate(&self, doc: &mut Document) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hydration {
    Hydrated { slug: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoRegistry,
    MissingSlug,
    UnknownSlug(String),
}

impl Hydration {
    pub fn is_hydrated(&self) -> bool {
        matches!(self, Hydration::Hydrated { .. })
    }
}

/// Extracts a query parameter from a query string ("?id=x" or "id=x"), a relative URL
/// ("blog-details.html?id=x") or an absolute URL.
pub fn query_param(location: &str, name: &str) -> Option<String> {
    let query = match location.split_once('?') {
        Some((_, query)) => query,
        None if location.contains('=') => location,
        None => return None,
    };
    // Drop the fragment, if any
    let query = query.split('#').next().unwrap_or_default();

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Looks up the record designated by `location`'s query string and hydrates the document with
/// it. Anything missing results in a `Skipped` outcome, never in an error.
pub fn hydrate_from_query<T: Hydrate>(
    doc: &mut Document,
    registry: Option<&Registry<T>>,
    location: &str,
) -> Result<Hydration> {
    let registry = match registry {
        Some(registry) => registry,
        None => {
            warn!("No content registry available, showing default content");
            return Ok(Hydration::Skipped(SkipReason::NoRegistry));
        }
    };

    let slug = match query_param(location, T::PARAM) {
        Some(slug) => slug,
        None => {
            debug!("No '{}' parameter in {:?}, showing default content", T::PARAM, location);
            return Ok(Hydration::Skipped(SkipReason::MissingSlug));
        }
    };

    match registry.get(&slug) {
        Some(record) => {
            record.hydrate(doc)?;
            Ok(Hydration::Hydrated { slug })
        }
        None => {
            warn!("'{}' not found, showing default content", slug);
            Ok(Hydration::Skipped(SkipReason::UnknownSlug(slug)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::query_param;

    #[test]
    fn test_query_param() {
        assert_eq!(Some("ili".to_string()), query_param("?service=ili", "service"));
        assert_eq!(Some("a b".to_string()), query_param("blog-details.html?x=1&id=a%20b#top", "id"));
        assert_eq!(Some("x".to_string()), query_param("https://example.com/p.html?id=x", "id"));
        assert_eq!(Some("x".to_string()), query_param("id=x", "id"));
        assert_eq!(None, query_param("blog-details.html", "id"));
        assert_eq!(None, query_param("?id=", "id"));
        assert_eq!(None, query_param("?service=ili", "id"));
    }
}
