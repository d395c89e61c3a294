use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::flatten, Badge, CatalogItem, NavCategory, NavEntry, NavSection, Section,
    },
};

fn entry(name: &str, link: &str, badge: Option<Badge>) -> NavEntry {
    NavEntry {
        name: name.to_string(),
        link: link.to_string(),
        badge,
    }
}

fn category(name: &str, items: Vec<NavEntry>) -> NavCategory {
    NavCategory {
        name: name.to_string(),
        items,
    }
}

/// The site's main navigation structure
pub fn builtin_navigation() -> Vec<NavSection> {
    use Badge::{Important, New, Popular};

    vec![
        NavSection {
            section: Section::Services,
            categories: vec![
                category(
                    "Building Envelope",
                    vec![
                        entry("Waterproofing", "/services/waterproofing", Some(Popular)),
                        entry("Roofing", "/services/roofing", Some(Popular)),
                        entry("Masonry", "/services/masonry", None),
                        entry("Sealants & Caulking", "/services/sealants", None),
                        entry("Facade Restoration", "/services/facade-restoration", Some(Important)),
                    ],
                ),
                category(
                    "Concrete & Structural",
                    vec![
                        entry("Concrete Repair", "/services/concrete-repair", None),
                        entry("Parking Garage Restoration", "/services/parking-garages", Some(New)),
                        entry("Structural Strengthening", "/services/structural", None),
                    ],
                ),
                category(
                    "Interiors",
                    vec![
                        entry("General Contracting", "/services/general-contracting", Some(Popular)),
                        entry("Tenant Improvements", "/services/tenant-improvements", None),
                    ],
                ),
            ],
        },
        NavSection {
            section: Section::Markets,
            categories: vec![category(
                "Market Sectors",
                vec![
                    entry("Healthcare", "/markets/healthcare", None),
                    entry("Education", "/markets/education", Some(Popular)),
                    entry("Commercial Office", "/markets/commercial", None),
                    entry("Multifamily Residential", "/markets/multifamily", None),
                    entry("Government", "/markets/government", None),
                    entry("Industrial", "/markets/industrial", None),
                ],
            )],
        },
        NavSection {
            section: Section::Projects,
            categories: vec![category(
                "Portfolio",
                vec![
                    entry("Featured Projects", "/projects", Some(Popular)),
                    entry("Case Studies", "/case-studies", None),
                    entry("Before & After", "/projects/before-after", Some(New)),
                ],
            )],
        },
        NavSection {
            section: Section::Company,
            categories: vec![category(
                "About",
                vec![
                    entry("About Us", "/about", None),
                    entry("Leadership", "/about/leadership", None),
                    entry("Safety", "/about/safety", Some(Important)),
                    entry("Careers", "/careers", Some(New)),
                ],
            )],
        },
        NavSection {
            section: Section::Resources,
            categories: vec![
                category(
                    "Insights",
                    vec![
                        entry("Blog", "/insights", None),
                        entry("Maintenance Guides", "/insights/maintenance-guides", None),
                        entry("FAQ", "/faq", None),
                    ],
                ),
                category(
                    "Get Started",
                    vec![
                        entry("Request a Quote", "/request-quote", Some(Important)),
                        entry("Submit an RFP", "/rfp", None),
                        entry("Project Estimator", "/estimate", Some(New)),
                    ],
                ),
            ],
        },
    ]
}

/// Flattens the navigation from `path` (JSON, same shape as the built-in one)
/// or the built-in structure, and validates the result
pub fn load_catalog(path: Option<&str>) -> AppResult<Vec<CatalogItem>> {
    let sections = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                AppError::Internal(format!("Failed to read catalog file {}: {}", path, e))
            })?;
            parse_navigation(&raw)?
        }
        None => builtin_navigation(),
    };

    let catalog = flatten(&sections);
    validate(&catalog)?;

    tracing::info!(
        items = catalog.len(),
        source = path.unwrap_or("builtin"),
        "Content catalog loaded"
    );

    Ok(catalog)
}

fn parse_navigation(raw: &str) -> AppResult<Vec<NavSection>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::InvalidInput(format!("Invalid catalog definition: {}", e)))
}

/// Every item needs a name and a link, and links are unique
fn validate(catalog: &[CatalogItem]) -> AppResult<()> {
    let mut links = HashSet::new();

    for item in catalog {
        if item.name.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Catalog item {} has no name",
                item.link
            )));
        }
        if item.link.trim().is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Catalog item {} has no link",
                item.name
            )));
        }
        if !links.insert(item.link.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Duplicate catalog link {}",
                item.link
            )));
        }
    }

    Ok(())
}
