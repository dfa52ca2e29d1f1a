use chrono::NaiveDate;

use super::Keyed;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub category: String,
    /// Label of the primary badge shown above the title
    pub badge: String,
    #[serde(default)]
    pub featured: bool,
    /// Publication date, as displayed (e.g. "Jan 28, 2026")
    pub date: String,
    pub read_time: String,
    pub author: String,
    pub author_role: String,
    pub author_image: String,
    /// Hero image URL
    pub image: String,
    pub tags: Vec<String>,
    /// Body, as trusted HTML
    pub content: String,
}

impl BlogPost {
    pub fn published_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%b %d, %Y").ok()
    }
}

impl Keyed for BlogPost {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod test {
    use crate::content::BLOG_DATA;

    #[test]
    fn test_publication_dates() {
        let post = BLOG_DATA.get("phmsa-updates").unwrap();
        assert_eq!(Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 25).unwrap()), post.published_on());
        assert!(!post.featured);

        // All posts have a parseable date, newest first
        let dates = BLOG_DATA.iter().map(|p| p.published_on().unwrap()).collect::<Vec<_>>();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
    }
}
