use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::AppError;

/// Running-time bucket a user may pick on the refinement form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum DurationBucket {
    /// Under 90 minutes
    Short,
    /// 90 to 120 minutes
    Standard,
    /// 120 to 180 minutes
    Long,
    /// 180 minutes and more
    Epic,
}

impl DurationBucket {
    /// Half-open minute range `[start, end)`; `None` end means unbounded
    pub fn range(&self) -> (u32, Option<u32>) {
        match self {
            DurationBucket::Short => (0, Some(90)),
            DurationBucket::Standard => (90, Some(120)),
            DurationBucket::Long => (120, Some(180)),
            DurationBucket::Epic => (180, None),
        }
    }

    pub fn contains(&self, minutes: u32) -> bool {
        let (start, end) = self.range();
        minutes >= start && end.map_or(true, |end| minutes < end)
    }
}

impl TryFrom<String> for DurationBucket {
    type Error = AppError;

    /// Accepts the form's positional tags (`"0"`..`"3"`) as well as bucket names
    fn try_from(tag: String) -> Result<Self, Self::Error> {
        match tag.as_str() {
            "0" | "short" => Ok(DurationBucket::Short),
            "1" | "standard" => Ok(DurationBucket::Standard),
            "2" | "long" => Ok(DurationBucket::Long),
            "3" | "epic" => Ok(DurationBucket::Epic),
            other => Err(AppError::InvalidInput(format!(
                "Unknown duration bucket '{}'",
                other
            ))),
        }
    }
}

/// The single soft-ranking facet active for a refinement, with its chosen values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SoftFacet {
    #[default]
    None,
    Genres(HashSet<String>),
    Actors(HashSet<String>),
    Directors(HashSet<String>),
}

impl SoftFacet {
    /// Builds the facet from the form's `filter` selector and value lists.
    /// An unrecognised or empty selector means no soft ranking.
    pub fn from_selector(
        selector: Option<&str>,
        genres: Vec<String>,
        actors: Vec<String>,
        directors: Vec<String>,
    ) -> Self {
        match selector {
            Some("genres") => SoftFacet::Genres(genres.into_iter().collect()),
            Some("actors") => SoftFacet::Actors(actors.into_iter().collect()),
            Some("directors") => SoftFacet::Directors(directors.into_iter().collect()),
            _ => SoftFacet::None,
        }
    }
}

/// User refinement choices for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChoices {
    /// Allowed languages; empty means any
    pub languages: HashSet<String>,
    /// Allowed running-time buckets; empty means any
    pub durations: HashSet<DurationBucket>,
    pub facet: SoftFacet,
}

/// Raw refinement form as posted by the front end
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefineRequest {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub duration: Vec<DurationBucket>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
}

impl From<RefineRequest> for UserChoices {
    fn from(request: RefineRequest) -> Self {
        let facet = SoftFacet::from_selector(
            request.filter.as_deref(),
            request.genres,
            request.actors,
            request.directors,
        );

        UserChoices {
            languages: request.languages.into_iter().collect(),
            durations: request.duration.into_iter().collect(),
            facet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert!(DurationBucket::Short.contains(89));
        assert!(!DurationBucket::Short.contains(90));
        assert!(DurationBucket::Standard.contains(90));
        assert!(DurationBucket::Long.contains(179));
        assert!(!DurationBucket::Long.contains(180));
        assert!(DurationBucket::Epic.contains(180));
        assert!(DurationBucket::Epic.contains(400));
    }

    #[test]
    fn test_bucket_accepts_positional_tags() {
        let buckets: Vec<DurationBucket> = serde_json::from_str(r#"["1", "epic"]"#).unwrap();
        assert_eq!(buckets, vec![DurationBucket::Standard, DurationBucket::Epic]);
    }

    #[test]
    fn test_bucket_rejects_unknown_tag() {
        let result: Result<Vec<DurationBucket>, _> = serde_json::from_str(r#"["7"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_selector_is_no_facet() {
        let facet = SoftFacet::from_selector(Some("ratings"), vec![], vec![], vec![]);
        assert_eq!(facet, SoftFacet::None);

        let facet = SoftFacet::from_selector(Some(""), vec!["Drama".into()], vec![], vec![]);
        assert_eq!(facet, SoftFacet::None);
    }

    #[test]
    fn test_refine_request_into_choices() {
        let request: RefineRequest = serde_json::from_str(
            r#"{"languages": ["English"], "duration": ["0"], "filter": "actors", "actors": ["Tom Hanks"]}"#,
        )
        .unwrap();

        let choices = UserChoices::from(request);
        assert!(choices.languages.contains("English"));
        assert!(choices.durations.contains(&DurationBucket::Short));
        assert_eq!(
            choices.facet,
            SoftFacet::Actors(["Tom Hanks".to_string()].into_iter().collect())
        );
    }
}
