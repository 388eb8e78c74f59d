pub mod age_filter;
pub mod evaluation;
pub mod facets;
pub mod neighbors;
pub mod recommendations;
pub mod similarity;
pub mod thumbnails;

pub use recommendations::{EngineSettings, RecommendationEngine};
pub use thumbnails::{ImdbThumbnailProvider, ThumbnailProvider};
