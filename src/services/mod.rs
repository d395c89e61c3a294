pub mod catalog;
pub mod history;
pub mod recommendations;
pub mod scorer;
pub mod search_analytics;

pub use recommendations::{RecommendationService, RecommendationSettings};
pub use scorer::{recommend, MAX_RECOMMENDATIONS};
