use crate::patterns::{self, Candidate};
use std::collections::BTreeSet;

/// Monetary candidates found in `text`, deduplicated.
///
/// The grouped-number matcher carries no currency anchor, so plain large
/// numbers (years, phone fragments) show up here as well. Treat the result as
/// candidates, not verified amounts.
pub fn extract_amounts(text: &str) -> BTreeSet<String> {
    extract_amount_candidates(text)
        .into_iter()
        .map(|candidate| candidate.text)
        .collect()
}

/// Tagged monetary candidates in matcher order, duplicates included
pub fn extract_amount_candidates(text: &str) -> Vec<Candidate> {
    patterns::amount_matchers()
        .iter()
        .flat_map(|matcher| matcher.find_all(text))
        .collect()
}
