//! Combined accept/cache decision for one provider result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::description::{DescriptionValidation, validate_description};
use super::sources::{LocationTarget, SourceValidation, validate_sources};
use crate::model::{LocationConfidence, RawInsights};

const SOURCE_WEIGHT: f64 = 0.30;
const DESCRIPTION_WEIGHT: f64 = 0.25;
const COMPLETENESS_WEIGHT: f64 = 0.20;
const LOCATION_WEIGHT: f64 = 0.25;

const ACCEPT_THRESHOLD: u8 = 50;
const CACHE_THRESHOLD: u8 = 65;
const HIGH_CONFIDENCE: u8 = 75;

const UNVERIFIED_LOCATION_SCORE: u8 = 50;
const VERIFICATION_BONUS: u8 = 10;
const MIN_VERIFICATION_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl Confidence {
    pub fn from_overall(overall: u8) -> Self {
        if overall >= HIGH_CONFIDENCE {
            Confidence::High
        } else if overall >= ACCEPT_THRESHOLD {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Per-component scores and the resulting decision.
///
/// `should_cache` implies `should_accept`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub source_score: u8,
    pub description_score: u8,
    pub completeness_score: u8,
    pub location_score: u8,
    pub overall: u8,
    pub confidence: Confidence,
    pub should_accept: bool,
    pub should_cache: bool,
    pub flags: Vec<String>,
}

/// Score a raw provider result against the location it was requested for.
///
/// A missing result scores zero across the board.
pub fn score_result(raw: Option<&RawInsights>, target: LocationTarget<'_>) -> ScoreBreakdown {
    let Some(raw) = raw else {
        return ScoreBreakdown { flags: vec!["null_result".into()], ..Default::default() };
    };
    let insights = &raw.insights;

    let sources = validate_sources(insights.sources.as_deref(), target);
    let description = validate_description(insights.description.as_deref(), insights.name.as_deref(), target);
    let completeness_score = completeness(raw);
    let (location_score, location_flag) = location(raw);

    let weighted = f64::from(sources.score) * SOURCE_WEIGHT
        + f64::from(description.score) * DESCRIPTION_WEIGHT
        + f64::from(completeness_score) * COMPLETENESS_WEIGHT
        + f64::from(location_score) * LOCATION_WEIGHT;
    let overall = weighted.round().clamp(0.0, 100.0) as u8;

    let mut flags: Vec<String> = sources.flags.iter().chain(&description.flags).cloned().collect();
    flags.extend(location_flag);

    let mut should_accept = overall >= ACCEPT_THRESHOLD;
    let mut should_cache = overall >= CACHE_THRESHOLD;
    if let Some(reason) = forced_rejection(&sources, &description) {
        should_accept = false;
        should_cache = false;
        flags.push(reason.into());
    }

    ScoreBreakdown {
        source_score: sources.score,
        description_score: description.score,
        completeness_score,
        location_score,
        overall,
        confidence: Confidence::from_overall(overall),
        should_accept,
        should_cache: should_cache && should_accept,
        flags,
    }
}

fn forced_rejection(sources: &SourceValidation, description: &DescriptionValidation) -> Option<&'static str> {
    if description.has_location_conflict() {
        return Some("rejected_location_conflict");
    }
    let suspicious = sources.suspicious_count;
    let trusted = sources.trusted_count;
    if suspicious >= 3 && trusted == 0 && suspicious >= 3 * trusted {
        return Some("rejected_suspicious_sources");
    }
    None
}

/// Weighted share of populated fields.
fn completeness(raw: &RawInsights) -> u8 {
    let insights = &raw.insights;
    let present = |field: &Option<String>| field.as_deref().is_some_and(|value| !value.trim().is_empty());

    let mut score = 0u8;
    if present(&insights.name) {
        score += 15;
    }
    if let Some(description) = insights.description.as_deref().map(str::trim)
        && !description.is_empty()
    {
        score += if description.chars().count() >= 50 { 30 } else { 15 };
    }
    score += match insights.feature_count() {
        0 => 0,
        1..=2 => 10,
        _ => 20,
    };
    if present(&insights.parking) {
        score += 10;
    }
    if insights.images.as_ref().is_some_and(|images| !images.is_empty()) {
        score += 10;
    }
    if present(&insights.accessibility) {
        score += 15;
    }
    score
}

fn location(raw: &RawInsights) -> (u8, Option<String>) {
    let (base, flag) = match raw.confidence() {
        Some(LocationConfidence::High) => (100, None),
        Some(LocationConfidence::Medium) => (70, None),
        Some(LocationConfidence::Low) => (20, Some("low_location_confidence".to_string())),
        None => (UNVERIFIED_LOCATION_SCORE, Some("location_unverified".to_string())),
    };
    let verified = raw
        .location_verification
        .as_deref()
        .is_some_and(|text| text.trim().chars().count() > MIN_VERIFICATION_LENGTH);
    let score = if verified { base.saturating_add(VERIFICATION_BONUS).min(100) } else { base };
    (score, flag)
}
