use std::{borrow::Borrow, cmp::Reverse, collections::HashSet};

use crate::models::{DurationBucket, MovieRecord, SoftFacet, UserChoices};

/// Narrows and reorders a candidate set according to the user's refinement
///
/// Steps, in order:
/// 1. language hard filter (no-op when no language is selected)
/// 2. duration hard filter; if no candidate falls in any selected bucket the
///    set is left unchanged instead of being emptied
/// 3. stable descending sort on the active soft facet, if any
/// 4. truncation to `n`
pub fn apply<T: Borrow<MovieRecord>>(
    candidates: Vec<T>,
    choices: &UserChoices,
    n: usize,
) -> Vec<T> {
    let candidates = filter_languages(candidates, &choices.languages);
    let mut candidates = filter_durations(candidates, &choices.durations);
    rank_by_facet(&mut candidates, &choices.facet);
    candidates.truncate(n);
    candidates
}

fn matches(value: &str, selected: &HashSet<String>) -> bool {
    !value.is_empty() && selected.contains(value)
}

fn filter_languages<T: Borrow<MovieRecord>>(
    candidates: Vec<T>,
    languages: &HashSet<String>,
) -> Vec<T> {
    if languages.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| matches(&c.borrow().language, languages))
        .collect()
}

fn filter_durations<T: Borrow<MovieRecord>>(
    candidates: Vec<T>,
    buckets: &HashSet<DurationBucket>,
) -> Vec<T> {
    if buckets.is_empty() {
        return candidates;
    }

    let in_buckets = |movie: &MovieRecord| {
        movie
            .duration
            .is_some_and(|minutes| buckets.iter().any(|b| b.contains(minutes)))
    };

    if !candidates.iter().any(|c| in_buckets(c.borrow())) {
        tracing::debug!(
            candidates = candidates.len(),
            "No candidate matches the selected durations, keeping all"
        );
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|c| in_buckets(c.borrow()))
        .collect()
}

fn rank_by_facet<T: Borrow<MovieRecord>>(candidates: &mut [T], facet: &SoftFacet) {
    match facet {
        SoftFacet::None => {}
        SoftFacet::Genres(genres) => candidates.sort_by_key(|c| {
            Reverse(c.borrow().genre_list().filter(|g| matches(g, genres)).count())
        }),
        SoftFacet::Actors(actors) => {
            candidates.sort_by_key(|c| Reverse(matches(&c.borrow().actor_1_name, actors)))
        }
        SoftFacet::Directors(directors) => {
            candidates.sort_by_key(|c| Reverse(matches(&c.borrow().director_name, directors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures::movie, MovieId};

    /// The four-row table used across the refinement scenarios
    fn candidates() -> Vec<MovieRecord> {
        let rows = [
            ("English", 90, "Drama|Comedy"),
            ("French", 120, "Action|Adventure"),
            ("Spanish", 150, "Horror|Thriller"),
            ("German", 180, "Sci-Fi|Fantasy"),
        ];
        rows.iter()
            .enumerate()
            .map(|(id, (language, duration, genres))| {
                let mut m = movie(id, &format!("Movie {}", id));
                m.language = language.to_string();
                m.duration = Some(*duration);
                m.genres = genres.to_string();
                m.actor_1_name = format!("Actor {}", id + 1);
                m.director_name = format!("Director {}", id + 1);
                m
            })
            .collect()
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn ids<T: Borrow<MovieRecord>>(rows: &[T]) -> Vec<MovieId> {
        rows.iter().map(|m| m.borrow().id).collect()
    }

    #[test]
    fn test_no_choices_keeps_order_and_truncates() {
        let result = apply(candidates(), &UserChoices::default(), 3);
        assert_eq!(ids(&result), vec![0, 1, 2]);
    }

    #[test]
    fn test_language_filter_preserves_relative_order() {
        let choices = UserChoices {
            languages: set(&["French", "English"]),
            ..Default::default()
        };
        let result = apply(candidates(), &choices, 5);
        assert_eq!(ids(&result), vec![0, 1]);
        let languages: HashSet<String> = result.iter().map(|m| m.language.clone()).collect();
        assert_eq!(languages, set(&["English", "French"]));
    }

    #[test]
    fn test_language_filter_can_empty_the_set() {
        let choices = UserChoices {
            languages: set(&["Japanese"]),
            ..Default::default()
        };
        assert!(apply(candidates(), &choices, 5).is_empty());
    }

    #[test]
    fn test_duration_filter_keeps_selected_buckets() {
        let choices = UserChoices {
            durations: [DurationBucket::Standard, DurationBucket::Long].into_iter().collect(),
            ..Default::default()
        };
        let result = apply(candidates(), &choices, 5);
        assert_eq!(ids(&result), vec![0, 1, 2]);
        assert!(result
            .iter()
            .all(|m| (90..180).contains(&m.duration.unwrap())));
    }

    #[test]
    fn test_duration_filter_without_match_is_noop() {
        let choices = UserChoices {
            durations: [DurationBucket::Short].into_iter().collect(),
            ..Default::default()
        };
        let result = apply(candidates(), &choices, 5);
        assert_eq!(ids(&result), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_missing_duration_matches_no_bucket() {
        let mut rows = candidates();
        rows[0].duration = None;
        let choices = UserChoices {
            durations: [DurationBucket::Standard, DurationBucket::Long].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(rows, &choices, 5)), vec![1, 2]);
    }

    #[test]
    fn test_genre_rank() {
        let choices = UserChoices {
            facet: SoftFacet::Genres(set(&["Drama", "Comedy"])),
            ..Default::default()
        };
        let mut rows = candidates();
        rows.swap(0, 1);
        let result = apply(rows, &choices, 1);
        assert_eq!(result[0].genres, "Drama|Comedy");
    }

    #[test]
    fn test_genre_rank_counts_overlap() {
        let mut rows = candidates();
        rows[3].genres = "Thriller|Horror".to_string();
        rows[2].genres = "Horror|Drama".to_string();
        let choices = UserChoices {
            facet: SoftFacet::Genres(set(&["Horror", "Thriller"])),
            ..Default::default()
        };
        // Rows 3 (two hits) then 2 (one hit) then the rest in input order
        assert_eq!(ids(&apply(rows, &choices, 4)), vec![3, 2, 0, 1]);
    }

    #[test]
    fn test_actor_rank_promotes_primary_actor() {
        let choices = UserChoices {
            facet: SoftFacet::Actors(set(&["Actor 1"])),
            ..Default::default()
        };
        let mut rows = candidates();
        rows.rotate_left(2);
        let result = apply(rows, &choices, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].actor_1_name, "Actor 1");
    }

    #[test]
    fn test_director_rank_is_stable() {
        let choices = UserChoices {
            facet: SoftFacet::Directors(set(&["Director 3"])),
            ..Default::default()
        };
        assert_eq!(ids(&apply(candidates(), &choices, 4)), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_empty_string_never_matches() {
        let mut rows = candidates();
        rows[3].director_name = String::new();
        let choices = UserChoices {
            facet: SoftFacet::Directors(set(&[""])),
            ..Default::default()
        };
        assert_eq!(ids(&apply(rows, &choices, 4)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let choices = UserChoices {
            languages: set(&["English", "French", "German"]),
            durations: [DurationBucket::Long, DurationBucket::Epic].into_iter().collect(),
            facet: SoftFacet::Genres(set(&["Fantasy"])),
        };
        let once = apply(candidates(), &choices, 2);
        let twice = apply(once.clone(), &choices, 2);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec![3, 1]);
    }

    #[test]
    fn test_fewer_than_n_returns_all() {
        let result = apply(candidates(), &UserChoices::default(), 10);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_works_on_borrowed_rows() {
        let rows = candidates();
        let borrowed: Vec<&MovieRecord> = rows.iter().collect();
        let choices = UserChoices {
            facet: SoftFacet::Actors(set(&["Actor 4"])),
            ..Default::default()
        };
        assert_eq!(ids(&apply(borrowed, &choices, 1)), vec![3]);
    }
}
