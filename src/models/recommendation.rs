use serde::Serialize;

use super::{MovieId, MovieRecord};

/// Facet values present in a candidate set, offered on the refinement form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacetOptions {
    pub languages: Vec<String>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
}

/// Autocomplete data for one audience tier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Autocomplete {
    pub titles: Vec<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
}

/// Sorted titles for every audience tier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TitlesByTier {
    pub adult: Vec<String>,
    pub teenager: Vec<String>,
    pub child: Vec<String>,
}

/// A final recommendation row returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedMovie {
    pub id: MovieId,
    pub title: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    /// Genres joined with ", " for display
    pub genres: String,
    pub actor: String,
    pub director: String,
    pub language: String,
    pub duration: Option<u32>,
}

impl RecommendedMovie {
    pub fn from_record(movie: &MovieRecord, thumbnail_url: Option<String>) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            url: movie.imdb_link.clone(),
            thumbnail_url,
            genres: movie.genre_list().collect::<Vec<_>>().join(", "),
            actor: movie.actor_1_name.clone(),
            director: movie.director_name.clone(),
            language: movie.language.clone(),
            duration: movie.duration,
        }
    }
}
