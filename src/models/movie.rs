use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Row position of a movie in the metadata table, shared with the feature table
pub type MovieId = usize;

/// Audience label carried by each catalog row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgeCategory {
    Adult,
    Teenager,
    Child,
    Unknown,
    /// Any label outside the four known ones, kept verbatim
    Other(String),
}

impl From<String> for AgeCategory {
    fn from(label: String) -> Self {
        match label.as_str() {
            "adult" => AgeCategory::Adult,
            "teenager" => AgeCategory::Teenager,
            "child" => AgeCategory::Child,
            "unknown" => AgeCategory::Unknown,
            _ => AgeCategory::Other(label),
        }
    }
}

impl From<AgeCategory> for String {
    fn from(category: AgeCategory) -> Self {
        category.to_string()
    }
}

impl Display for AgeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgeCategory::Adult => write!(f, "adult"),
            AgeCategory::Teenager => write!(f, "teenager"),
            AgeCategory::Child => write!(f, "child"),
            AgeCategory::Unknown => write!(f, "unknown"),
            AgeCategory::Other(label) => write!(f, "{}", label),
        }
    }
}

/// Content-restriction view of the catalog requested by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceTier {
    #[default]
    Adult,
    Teenager,
    Child,
}

impl AudienceTier {
    pub const ALL: [AudienceTier; 3] = [
        AudienceTier::Adult,
        AudienceTier::Teenager,
        AudienceTier::Child,
    ];

    /// Whether a movie carrying `category` is visible in this tier
    pub fn admits(&self, category: &AgeCategory) -> bool {
        match self {
            AudienceTier::Adult => true,
            AudienceTier::Teenager => *category != AgeCategory::Adult,
            AudienceTier::Child => {
                matches!(category, AgeCategory::Child | AgeCategory::Unknown)
            }
        }
    }
}

impl Display for AudienceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudienceTier::Adult => write!(f, "adult"),
            AudienceTier::Teenager => write!(f, "teenager"),
            AudienceTier::Child => write!(f, "child"),
        }
    }
}

impl FromStr for AudienceTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adult" => Ok(AudienceTier::Adult),
            "teenager" => Ok(AudienceTier::Teenager),
            "child" => Ok(AudienceTier::Child),
            other => Err(AppError::InvalidInput(format!(
                "Unknown age category '{}'",
                other
            ))),
        }
    }
}

/// One movie of the catalog
///
/// Absent text fields hold an empty string rather than `None`, so comparisons
/// against user selections stay plain string comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub language: String,
    /// Running time in minutes, `None` when the catalog has no value
    pub duration: Option<u32>,
    /// Pipe-delimited genre list, primary genre first
    pub genres: String,
    pub actor_1_name: String,
    pub actor_2_name: String,
    pub actor_3_name: String,
    pub director_name: String,
    pub age_category: AgeCategory,
    pub imdb_link: String,
    pub country: String,
    pub content_rating: String,
    pub title_year: Option<f64>,
    pub imdb_score: Option<f64>,
    pub budget: Option<f64>,
    pub gross: Option<f64>,
}

impl MovieRecord {
    /// Genres in catalog order
    pub fn genre_list(&self) -> impl Iterator<Item = &str> {
        self.genres.split('|')
    }

    /// The three cast slots, primary actor first
    pub fn actors(&self) -> [&str; 3] {
        [
            self.actor_1_name.as_str(),
            self.actor_2_name.as_str(),
            self.actor_3_name.as_str(),
        ]
    }
}

/// Precomputed numeric encoding of one movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub id: MovieId,
    pub values: Vec<f64>,
}
