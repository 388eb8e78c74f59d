//! Thumbnail lookup for recommended movies
//!
//! Thumbnails are cosmetic: a lookup failure for one movie never affects the
//! recommendations themselves, the row simply comes back without an image.

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MovieRecord, RecommendedMovie},
};

pub mod imdb;

pub use imdb::ImdbThumbnailProvider;

/// Source of thumbnail images for a movie reference page
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ThumbnailProvider: Send + Sync {
    /// Resolves the image URL shown for the movie at `reference_url`
    async fn thumbnail_url(&self, reference_url: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Builds the result rows for `movies`, fetching thumbnails concurrently
///
/// Row order follows `movies`; a failed or panicked lookup leaves that row's
/// `thumbnail_url` empty.
pub async fn attach_thumbnails(
    provider: Arc<dyn ThumbnailProvider>,
    movies: Vec<MovieRecord>,
) -> Vec<RecommendedMovie> {
    let mut tasks = Vec::new();

    for movie in &movies {
        let provider = provider.clone();
        let url = movie.imdb_link.clone();
        let task = tokio::spawn(async move {
            if url.is_empty() {
                return None;
            }
            match provider.thumbnail_url(&url).await {
                Ok(thumbnail) => Some(thumbnail),
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        provider = provider.name(),
                        error = %e,
                        "Thumbnail lookup failed"
                    );
                    None
                }
            }
        });
        tasks.push(task);
    }

    let mut results = Vec::with_capacity(movies.len());
    let mut missing = 0;

    for (movie, task) in movies.iter().zip(tasks) {
        let thumbnail = match task.await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                tracing::error!(error = %e, "Thumbnail task join error");
                None
            }
        };
        if thumbnail.is_none() {
            missing += 1;
        }
        results.push(RecommendedMovie::from_record(movie, thumbnail));
    }

    if missing > 0 {
        tracing::warn!(
            rows = results.len(),
            missing,
            "Some recommendations have no thumbnail"
        );
    }

    results
}
