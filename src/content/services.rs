use super::Keyed;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDetail {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub hero_image: String,
    pub overview_title: String,
    /// The two overview paragraphs
    pub overview: [String; 2],
    pub benefits: Vec<String>,
    pub technologies: Vec<Technology>,
    #[serde(default)]
    pub capabilities_title: Option<String>,
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    pub title: String,
    pub description: String,
    /// Inline SVG markup
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub title: String,
    pub description: String,
}

impl Keyed for ServiceDetail {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &str {
        &self.title
    }
}
