//! Description text validation.
//!
//! Rewards playground-specific vocabulary, penalizes real-estate and
//! hospitality wording, and flags descriptions that place the playground in
//! a different major city or state than the one it was looked up in.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::keywords::{CORE_KEYWORDS, HEDGE_WORDS, MAJOR_CITIES, NEGATIVE_KEYWORDS, SECONDARY_KEYWORDS, STATES, count_matches};
use super::sources::LocationTarget;

const MIN_LENGTH: usize = 20;
const DETAILED_LENGTH: usize = 50;
const BASE_SCORE: i32 = 50;
const DETAIL_BONUS: i32 = 10;
const CORE_BONUS: i32 = 5;
const SECONDARY_BONUS: i32 = 2;
const NEGATIVE_PENALTY: i32 = 10;
const CONFLICT_PENALTY: i32 = 20;
const NO_CORE_CAP: i32 = 20;
const MIN_VALID_SCORE: u8 = 30;
const HEDGE_WINDOW: usize = 20;

/// Whole-word matcher for every known city and state name.
static PLACE_NAMES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternation = MAJOR_CITIES
        .iter()
        .chain(STATES)
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).ok()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionValidation {
    pub score: u8,
    pub is_valid: bool,
    pub core_matches: usize,
    pub secondary_matches: usize,
    pub negative_matches: usize,
    /// Unhedged mentions of a location other than the target.
    pub conflicts: Vec<String>,
    pub flags: Vec<String>,
}

impl DescriptionValidation {
    pub fn has_location_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Validate a description against an optional name and target location.
///
/// `name` is only used to avoid flagging a place name that is part of the
/// playground's own name.
pub fn validate_description(
    description: Option<&str>, name: Option<&str>, target: LocationTarget<'_>,
) -> DescriptionValidation {
    let Some(text) = description.map(str::trim).filter(|text| text.chars().count() >= MIN_LENGTH) else {
        return DescriptionValidation { flags: vec!["description_too_short".into()], ..Default::default() };
    };

    let lowered = text.to_lowercase();
    let core_matches = count_matches(&lowered, CORE_KEYWORDS);
    let secondary_matches = count_matches(&lowered, SECONDARY_KEYWORDS);
    let negative_matches = count_matches(&lowered, NEGATIVE_KEYWORDS);

    let mut flags = Vec::new();
    let mut score = BASE_SCORE;
    if text.chars().count() >= DETAILED_LENGTH {
        score += DETAIL_BONUS;
    }
    score += CORE_BONUS * core_matches as i32;
    score += SECONDARY_BONUS * secondary_matches as i32;
    score -= NEGATIVE_PENALTY * negative_matches as i32;
    if negative_matches > 0 {
        flags.push("off_topic_wording".into());
    }

    let conflicts = if target.is_known() { location_conflicts(&lowered, name, target) } else { Vec::new() };
    score -= CONFLICT_PENALTY * conflicts.len() as i32;
    if !conflicts.is_empty() {
        flags.push("location_conflict".into());
    }

    if core_matches == 0 {
        score = score.min(NO_CORE_CAP);
        flags.push("no_playground_keywords".into());
    }

    let score = score.clamp(0, 100) as u8;
    let is_valid = core_matches > 0 && conflicts.is_empty() && score >= MIN_VALID_SCORE;

    DescriptionValidation { score, is_valid, core_matches, secondary_matches, negative_matches, conflicts, flags }
}

/// Place names in `lowered` that differ from the target and are not hedged.
fn location_conflicts(lowered: &str, name: Option<&str>, target: LocationTarget<'_>) -> Vec<String> {
    let Some(pattern) = PLACE_NAMES.as_ref() else {
        return Vec::new();
    };
    let expected: Vec<String> = [target.city, target.region, name]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect();

    let mut conflicts: Vec<String> = Vec::new();
    for found in pattern.find_iter(lowered) {
        let mention = found.as_str();
        if expected.iter().any(|part| part.contains(mention)) {
            continue;
        }
        if is_hedged(lowered, found.start(), found.end()) {
            continue;
        }
        conflicts.push(mention.to_string());
    }
    conflicts
}

/// Whether a hedge word appears within the window around `start..end`.
fn is_hedged(text: &str, start: usize, end: usize) -> bool {
    let mut from = start.saturating_sub(HEDGE_WINDOW);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + HEDGE_WINDOW).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    let window = &text[from..to];
    HEDGE_WORDS.iter().any(|hedge| {
        window
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == *hedge)
    })
}
