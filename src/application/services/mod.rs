mod catalog;
mod ratings;
mod recommendations;

pub use catalog::{CatalogService, EXTERNAL_TOTAL_ESTIMATE};
pub use ratings::RatingService;
pub use recommendations::RecommendationService;
