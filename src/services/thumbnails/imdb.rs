//! IMDb thumbnail provider
//!
//! Lookup flow:
//! 1. Reference URL `http://www.imdb.com/title/tt0472259/?ref_=fn_tt_tt_1`
//! 2. Media index `http://www.imdb.com/title/tt0472259/mediaindex?ref_=tt_ov_mi_sm`
//! 3. First `<img>` of that page → its `src`

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as HttpClient;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    services::thumbnails::ThumbnailProvider,
};

const MEDIA_INDEX_SUFFIX: &str = "/mediaindex?ref_=tt_ov_mi_sm";

static IMG_SRC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
        .expect("Failed to compile img src regex")
});

#[derive(Clone)]
pub struct ImdbThumbnailProvider {
    http_client: HttpClient,
}

impl ImdbThumbnailProvider {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }
}

/// Media index page of a movie, derived from its reference URL by replacing
/// the last path segment
pub fn media_index_url(reference_url: &str) -> AppResult<String> {
    let (base, _) = reference_url.rsplit_once('/').ok_or_else(|| {
        AppError::InvalidInput(format!("Not a movie reference URL: '{}'", reference_url))
    })?;

    if base.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Not a movie reference URL: '{}'",
            reference_url
        )));
    }

    Ok(format!("{}{}", base, MEDIA_INDEX_SUFFIX))
}

/// `src` of the first `<img>` tag in `html`
pub fn first_image_src(html: &str) -> Option<String> {
    IMG_SRC_REGEX
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait::async_trait]
impl ThumbnailProvider for ImdbThumbnailProvider {
    async fn thumbnail_url(&self, reference_url: &str) -> AppResult<String> {
        let url = media_index_url(reference_url)?;

        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Media index {} returned status {}",
                url,
                response.status()
            )));
        }

        let html = response.text().await?;

        let thumbnail = first_image_src(&html)
            .ok_or_else(|| AppError::ExternalApi(format!("No image found on {}", url)))?;

        tracing::debug!(url = %url, thumbnail = %thumbnail, "Thumbnail resolved");

        Ok(thumbnail)
    }

    fn name(&self) -> &'static str {
        "imdb"
    }
}
