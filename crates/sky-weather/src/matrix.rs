//! Host weather state -> Condition
//!
//! Hosts report free-form states ("Heavy rain", "partly_cloudy", "Lightning-Rainy Storm").
//! Rows are checked top to bottom against the lowercased state; the first row with
//! a matching substring wins, so the stormiest reading dominates.

use crate::Condition;

/// Ordered keyword table, first match wins
pub const KEYWORD_TABLE: &[(&[&str], Condition)] = &[
    (&["lightning", "storm"], Condition::LightningRainy),
    (&["pouring", "heavy"], Condition::Pouring),
    (&["rain"], Condition::Rainy),
    (&["snow"], Condition::Snowy),
    (&["partly", "broken"], Condition::PartlyCloudy),
    (&["cloud"], Condition::Cloudy),
    (&["fog", "mist"], Condition::Fog),
    (&["clear"], Condition::ClearNight),
];

/// Anything the table does not recognise
pub const FALLBACK_CONDITION: Condition = Condition::Sunny;

pub fn classify(state: &str) -> Condition {
    let state = state.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| state.contains(k)))
        .map(|(_, condition)| *condition)
        .unwrap_or(FALLBACK_CONDITION)
}
