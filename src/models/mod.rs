mod choices;
mod movie;
mod recommendation;
mod session;

pub use choices::{DurationBucket, RefineRequest, SoftFacet, UserChoices};
pub use movie::{AgeCategory, AudienceTier, FeatureVector, MovieId, MovieRecord};
pub use recommendation::{Autocomplete, FacetOptions, RecommendedMovie, TitlesByTier};
pub use session::{CandidateSet, RecommendationSession};
