use std::borrow::Borrow;

use crate::models::MovieRecord;

/// Agreement between a reference movie and a set of candidates
///
/// Per candidate:
/// - genre at 1-based position `j` of the candidate's list scores `1/j` if the
///   reference shares it, so primary genres weigh more
/// - +1 per cast slot whose actor appears anywhere in the reference cast
/// - +1 if both share the director
///
/// Empty names never match.
pub fn score<T: Borrow<MovieRecord>>(reference: &MovieRecord, candidates: &[T]) -> f64 {
    candidates
        .iter()
        .map(|candidate| score_candidate(reference, candidate.borrow()))
        .sum()
}

pub fn score_candidate(reference: &MovieRecord, candidate: &MovieRecord) -> f64 {
    let reference_genres: Vec<&str> = reference.genre_list().filter(|g| !g.is_empty()).collect();
    let reference_cast = reference.actors();

    let genre_score: f64 = candidate
        .genre_list()
        .enumerate()
        .filter(|(_, genre)| reference_genres.contains(genre))
        .map(|(position, _)| 1.0 / (position + 1) as f64)
        .sum();

    let cast_score = candidate
        .actors()
        .into_iter()
        .filter(|actor| !actor.is_empty() && reference_cast.contains(actor))
        .count() as f64;

    let director_score = if !candidate.director_name.is_empty()
        && candidate.director_name == reference.director_name
    {
        1.0
    } else {
        0.0
    };

    genre_score + cast_score + director_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::movie;

    fn reference() -> MovieRecord {
        let mut m = movie(0, "The Dark Knight");
        m.genres = "Action|Crime|Drama".to_string();
        m.actor_1_name = "Christian Bale".to_string();
        m.actor_2_name = "Heath Ledger".to_string();
        m.actor_3_name = "Morgan Freeman".to_string();
        m.director_name = "Christopher Nolan".to_string();
        m
    }

    #[test]
    fn test_genre_weight_decreases_with_position() {
        let mut candidate = movie(1, "Heat");
        candidate.genres = "Crime|Thriller|Drama".to_string();
        // Crime at 1 -> 1.0, Drama at 3 -> 1/3
        let s = score_candidate(&reference(), &candidate);
        assert!((s - (1.0 + 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_cast_and_director_overlap() {
        let mut candidate = movie(1, "The Prestige");
        candidate.genres = "Mystery".to_string();
        candidate.actor_1_name = "Hugh Jackman".to_string();
        candidate.actor_2_name = "Christian Bale".to_string();
        candidate.actor_3_name = "Morgan Freeman".to_string();
        candidate.director_name = "Christopher Nolan".to_string();
        assert_eq!(score_candidate(&reference(), &candidate), 3.0);
    }

    #[test]
    fn test_empty_names_never_match() {
        let mut reference = reference();
        reference.actor_3_name = String::new();
        reference.director_name = String::new();

        let mut candidate = movie(1, "Unknown");
        candidate.genres = String::new();
        assert_eq!(score_candidate(&reference, &candidate), 0.0);
    }

    #[test]
    fn test_score_sums_over_candidates() {
        let mut a = movie(1, "Batman Begins");
        a.genres = "Action|Adventure".to_string();
        a.director_name = "Christopher Nolan".to_string();
        let mut b = movie(2, "Se7en");
        b.genres = "Crime|Drama".to_string();

        // a: 1 + 1, b: 1 + 1/2
        let total = score(&reference(), &[a, b]);
        assert!((total - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_score_of_no_candidates_is_zero() {
        let candidates: Vec<MovieRecord> = Vec::new();
        assert_eq!(score(&reference(), &candidates), 0.0);
    }
}
