use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Highlight shown next to a navigation entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    New,
    Popular,
    Important,
}

/// Top-level grouping of the site navigation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Section {
    Services,
    Markets,
    Projects,
    Company,
    Resources,
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Services => "Services",
            Section::Markets => "Markets",
            Section::Projects => "Projects",
            Section::Company => "Company",
            Section::Resources => "Resources",
        };
        write!(f, "{}", name)
    }
}

/// A single navigable content item, flattened from the navigation structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    /// Route of the item; unique across the catalog
    pub link: String,
    pub category: String,
    pub section: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
}

// ============================================================================
// Nested navigation structure
// ============================================================================

/// Leaf entry of the navigation structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavEntry {
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub badge: Option<Badge>,
}

/// A named group of entries inside a section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavCategory {
    pub name: String,
    pub items: Vec<NavEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavSection {
    pub section: Section,
    pub categories: Vec<NavCategory>,
}

/// Flattens the nested structure in declaration order
pub fn flatten(sections: &[NavSection]) -> Vec<CatalogItem> {
    sections
        .iter()
        .flat_map(|section| {
            section.categories.iter().flat_map(move |category| {
                category.items.iter().map(move |entry| CatalogItem {
                    name: entry.name.clone(),
                    link: entry.link.clone(),
                    category: category.name.clone(),
                    section: section.section,
                    badge: entry.badge,
                })
            })
        })
        .collect()
}
