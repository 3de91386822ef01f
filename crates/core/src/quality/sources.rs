//! Source URL validation.
//!
//! Starts from a neutral 50 and adjusts per URL for trusted or suspicious
//! domains, park-related paths, and mentions of the target location.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::keywords::{SUSPICIOUS_DOMAINS, TRUSTED_DOMAINS, URL_KEYWORDS, host_matches};

const BASE_SCORE: i32 = 50;
const TRUSTED_BONUS: i32 = 10;
const SUSPICIOUS_PENALTY: i32 = 15;
const KEYWORD_BONUS: i32 = 5;
const CITY_BONUS: i32 = 10;
const REGION_BONUS: i32 = 5;
const MIN_VALID_SCORE: u8 = 30;

/// Location the content is expected to describe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationTarget<'a> {
    pub city: Option<&'a str>,
    pub region: Option<&'a str>,
}

impl LocationTarget<'_> {
    pub fn is_known(&self) -> bool {
        self.city.is_some() || self.region.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceValidation {
    pub score: u8,
    pub is_valid: bool,
    pub trusted_count: usize,
    pub suspicious_count: usize,
    pub flags: Vec<String>,
}

/// Score a list of source URLs against an optional target location.
pub fn validate_sources(sources: Option<&[String]>, target: LocationTarget<'_>) -> SourceValidation {
    let sources = sources.unwrap_or_default();
    if sources.is_empty() {
        return SourceValidation { flags: vec!["no_sources".into()], ..Default::default() };
    }

    let city = target.city.map(spelling_variants).unwrap_or_default();
    let region = target.region.map(spelling_variants).unwrap_or_default();

    let mut score = BASE_SCORE;
    let mut trusted_count = 0;
    let mut suspicious_count = 0;
    let mut flags = Vec::new();

    for source in sources {
        let lowered = source.trim().to_lowercase();
        let host = Url::parse(&lowered)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default();
        if host.is_empty() {
            flags.push(format!("unparseable_source:{source}"));
        }

        if !host.is_empty() && TRUSTED_DOMAINS.iter().any(|entry| host_matches(&host, entry)) {
            trusted_count += 1;
            score += TRUSTED_BONUS;
        }
        if !host.is_empty() && SUSPICIOUS_DOMAINS.iter().any(|entry| host_matches(&host, entry)) {
            suspicious_count += 1;
            score -= SUSPICIOUS_PENALTY;
        }
        if URL_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            score += KEYWORD_BONUS;
        }
        if city.iter().any(|variant| lowered.contains(variant.as_str())) {
            score += CITY_BONUS;
        }
        if region.iter().any(|variant| lowered.contains(variant.as_str())) {
            score += REGION_BONUS;
        }
    }

    if trusted_count == 0 {
        flags.push("no_trusted_sources".into());
    }
    if suspicious_count > 0 {
        flags.push(format!("suspicious_sources:{suspicious_count}"));
    }

    let score = score.clamp(0, 100) as u8;
    let is_valid = score >= MIN_VALID_SCORE && !(trusted_count == 0 && suspicious_count >= 3);

    SourceValidation { score, is_valid, trusted_count, suspicious_count, flags }
}

/// The ways a place name may be spelled inside a URL.
fn spelling_variants(name: &str) -> Vec<String> {
    let words: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return Vec::new();
    }
    let mut variants = vec![words.join(" "), words.join("-"), words.join("_"), words.concat()];
    variants.dedup();
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zero_sources_rejected() {
        let result = validate_sources(None, LocationTarget::default());
        assert_eq!(result.score, 0);
        assert!(!result.is_valid);
        assert_eq!(result.flags, vec!["no_sources"]);

        let empty: Vec<String> = Vec::new();
        assert_eq!(validate_sources(Some(&empty), LocationTarget::default()).score, 0);
    }

    #[test]
    fn test_trusted_park_source() {
        let sources = urls(&["https://parks.example.gov/dolores"]);
        let result = validate_sources(Some(&sources), LocationTarget::default());
        assert_eq!(result.score, 65);
        assert_eq!(result.trusted_count, 1);
        assert!(result.is_valid);
    }

    #[test]
    fn test_city_and_region_variants() {
        let sources = urls(&["https://example.com/san_francisco/california/page"]);
        let target = LocationTarget { city: Some("San Francisco"), region: Some("California") };
        let result = validate_sources(Some(&sources), target);
        assert_eq!(result.score, 65);

        let sources = urls(&["https://example.com/sanfrancisco"]);
        assert_eq!(validate_sources(Some(&sources), target).score, 60);
    }

    #[test]
    fn test_suspicious_sources_invalidate() {
        let sources = urls(&[
            "https://www.zillow.com/homedetails/1",
            "https://www.shutterstock.com/image-photo/swing",
            "https://www.pinterest.com/pin/2",
        ]);
        let result = validate_sources(Some(&sources), LocationTarget::default());
        assert_eq!(result.suspicious_count, 3);
        assert_eq!(result.trusted_count, 0);
        assert_eq!(result.score, 5);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_three_suspicious_with_trusted_can_pass() {
        let sources = urls(&[
            "https://en.wikipedia.org/wiki/Dolores_Park",
            "https://sfrecpark.org/park/dolores",
            "https://www.yelp.com/biz/dolores-park",
            "https://www.tripadvisor.com/dolores",
            "https://www.instagram.com/p/1",
            "https://www.facebook.com/events/2",
            "https://www.reddit.com/r/sf/3",
        ]);
        let result = validate_sources(Some(&sources), LocationTarget::default());
        assert_eq!(result.trusted_count, 3);
        assert_eq!(result.suspicious_count, 3);
        assert!(result.is_valid);
    }

    #[test]
    fn test_score_clamped() {
        let sources: Vec<String> = (0..12).map(|i| format!("https://parks.city.gov/playground/{i}")).collect();
        assert_eq!(validate_sources(Some(&sources), LocationTarget::default()).score, 100);
    }
}
