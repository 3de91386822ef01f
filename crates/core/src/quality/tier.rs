//! Display tier derived from enriched content.

use super::keywords::{ACCESSIBILITY_KEYWORDS, AWARD_KEYWORDS, DISTINCT_KEYWORDS, count_matches};
use crate::model::{Insights, Tier};

const STAR_POINTS: u32 = 7;
const GEM_POINTS: u32 = 3;
const STAR_AWARD_FEATURES: usize = 5;

/// Classify insights into a tier with a human-readable reason.
///
/// Points: features (1 for 3+, 2 for 5+, 3 for 8+), accessibility terms
/// (1 for one, 2 for three or more), distinctive or themed wording (1 each,
/// up to 2) and award wording (2).
pub fn calculate_tier(insights: Option<&Insights>) -> (Tier, String) {
    let Some(insights) = insights else {
        return (Tier::Neighborhood, "No enrichment data".to_string());
    };

    let features = insights.feature_count();
    let mut text = String::new();
    for part in [insights.name.as_deref(), insights.description.as_deref()].into_iter().flatten() {
        text.push_str(part);
        text.push(' ');
    }
    for feature in insights.features.iter().flatten() {
        text.push_str(feature);
        text.push(' ');
    }
    let text = text.to_lowercase();
    let accessibility_text = insights.accessibility.as_deref().unwrap_or_default().to_lowercase();

    let accessibility_hits = count_matches(&accessibility_text, ACCESSIBILITY_KEYWORDS)
        .max(count_matches(&text, ACCESSIBILITY_KEYWORDS));
    let distinct_hits = count_matches(&text, DISTINCT_KEYWORDS);
    let award = count_matches(&text, AWARD_KEYWORDS) > 0;

    let mut points = 0u32;
    let mut reasons = Vec::new();

    let feature_points = match features {
        0..=2 => 0,
        3..=4 => 1,
        5..=7 => 2,
        _ => 3,
    };
    if feature_points > 0 {
        points += feature_points;
        reasons.push(format!("{features} features"));
    }

    let accessibility_points = match accessibility_hits {
        0 => 0,
        1..=2 => 1,
        _ => 2,
    };
    if accessibility_points > 0 {
        points += accessibility_points;
        reasons.push("accessible design".to_string());
    }

    if distinct_hits > 0 {
        points += distinct_hits.min(2) as u32;
        reasons.push("distinctive or themed play".to_string());
    }

    if award {
        points += 2;
        reasons.push("award-level recognition".to_string());
    }

    let tier = if (award && features >= STAR_AWARD_FEATURES) || points >= STAR_POINTS {
        Tier::Star
    } else if points >= GEM_POINTS {
        Tier::Gem
    } else {
        Tier::Neighborhood
    };

    let reasoning = if reasons.is_empty() {
        "Basic neighborhood playground".to_string()
    } else {
        let mut reasoning = reasons.join(", ");
        if let Some(first) = reasoning.get(..1) {
            reasoning = first.to_uppercase() + &reasoning[1..];
        }
        reasoning
    };

    (tier, reasoning)
}
