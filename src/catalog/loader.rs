use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{AgeCategory, FeatureVector, MovieId, MovieRecord},
};

/// One metadata row as it appears in the CSV; unused columns are ignored
#[derive(Debug, Deserialize)]
struct RawMovieRow {
    movie_title: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    actor_1_name: Option<String>,
    #[serde(default)]
    actor_2_name: Option<String>,
    #[serde(default)]
    actor_3_name: Option<String>,
    #[serde(default)]
    director_name: Option<String>,
    #[serde(default)]
    age_category: Option<String>,
    #[serde(default)]
    movie_imdb_link: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    content_rating: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    title_year: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    imdb_score: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    budget: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    gross: Option<f64>,
}

impl RawMovieRow {
    fn into_record(self, id: MovieId) -> AppResult<MovieRecord> {
        let duration = match self.duration {
            // Whole minutes; 89.5 is still under 90
            Some(minutes) if minutes.is_finite() && minutes >= 0.0 => {
                Some(minutes.floor() as u32)
            }
            Some(minutes) => {
                return Err(AppError::DataUnavailable(format!(
                    "Row {} has an invalid duration {}",
                    id, minutes
                )))
            }
            None => None,
        };

        Ok(MovieRecord {
            id,
            title: self.movie_title.trim().to_string(),
            language: text(self.language),
            duration,
            genres: text(self.genres),
            actor_1_name: text(self.actor_1_name),
            actor_2_name: text(self.actor_2_name),
            actor_3_name: text(self.actor_3_name),
            director_name: text(self.director_name),
            age_category: AgeCategory::from(text(self.age_category)),
            imdb_link: text(self.movie_imdb_link),
            country: text(self.country),
            content_rating: text(self.content_rating),
            title_year: self.title_year,
            imdb_score: self.imdb_score,
            budget: self.budget,
            gross: self.gross,
        })
    }
}

/// Missing text becomes the empty string; surrounding whitespace (including
/// the non-breaking spaces common in scraped titles) is dropped
fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn open(path: &Path) -> AppResult<File> {
    File::open(path).map_err(|e| {
        AppError::DataUnavailable(format!("Cannot open {}: {}", path.display(), e))
    })
}

/// Reads the movie metadata table; ids are row positions
pub fn load_movies(path: &Path) -> AppResult<Vec<MovieRecord>> {
    let movies = read_movies(open(path)?)?;
    tracing::info!(path = %path.display(), rows = movies.len(), "Loaded movie metadata");
    Ok(movies)
}

pub fn read_movies<R: Read>(source: R) -> AppResult<Vec<MovieRecord>> {
    let mut reader = csv::Reader::from_reader(source);

    reader
        .deserialize::<RawMovieRow>()
        .enumerate()
        .map(|(id, row)| row.map_err(AppError::from)?.into_record(id))
        .collect()
}

/// Reads the precomputed feature table: first column is the movie id,
/// the remaining columns are the vector
pub fn load_feature_table(path: &Path) -> AppResult<Vec<FeatureVector>> {
    let features = read_feature_table(open(path)?)?;
    tracing::info!(
        path = %path.display(),
        rows = features.len(),
        dimension = features.first().map(|f| f.values.len()).unwrap_or(0),
        "Loaded feature table"
    );
    Ok(features)
}

pub fn read_feature_table<R: Read>(source: R) -> AppResult<Vec<FeatureVector>> {
    // Row width is validated against the catalog, not by the reader
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let mut features = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields = record.iter();

        let id_field = fields.next().unwrap_or_default().trim();
        let id = parse_id(id_field).ok_or_else(|| {
            AppError::DataUnavailable(format!(
                "Feature row {} has an invalid id '{}'",
                line, id_field
            ))
        })?;

        let values = fields
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| {
                    AppError::DataUnavailable(format!(
                        "Feature row {} (id {}) has a non-numeric value '{}'",
                        line, id, field
                    ))
                })
            })
            .collect::<AppResult<Vec<f64>>>()?;

        features.push(FeatureVector { id, values });
    }

    Ok(features)
}

/// Ids are written either as integers or as integral floats ("12.0")
fn parse_id(field: &str) -> Option<MovieId> {
    if let Ok(id) = field.parse::<MovieId>() {
        return Some(id);
    }
    let value = field.parse::<f64>().ok()?;
    (value >= 0.0 && value.fract() == 0.0).then_some(value as MovieId)
}
