use crate::models::{AudienceTier, MovieRecord};

/// Restricts the catalog to the movies visible in an audience tier
///
/// - `adult`: every movie
/// - `teenager`: every movie not labelled `adult`
/// - `child`: movies labelled `child` or `unknown`
pub fn filter_by_age(records: &[MovieRecord], tier: AudienceTier) -> Vec<&MovieRecord> {
    records
        .iter()
        .filter(|movie| tier.admits(&movie.age_category))
        .collect()
}
