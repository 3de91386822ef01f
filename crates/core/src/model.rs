//! Domain types shared by the enrichment pipeline and its callers.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;
use crate::quality::ScoreBreakdown;

/// Hard cap on entities per batch call.
pub const MAX_BATCH_SIZE: usize = 5;

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Administrative location returned by reverse geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Place {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// One entity to enrich.
///
/// Either `stable_external_id`, or `coordinates` together with
/// `display_name_hint`, must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    pub entity_id: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub stable_external_id: Option<String>,
    #[serde(default)]
    pub display_name_hint: Option<String>,
}

impl EnrichmentRequest {
    pub fn stable_id(&self) -> Option<&str> {
        self.stable_external_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub fn name_hint(&self) -> Option<&str> {
        self.display_name_hint.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the entity cannot be identified.
    pub fn validate(&self) -> Result<(), Error> {
        if self.entity_id.trim().is_empty() {
            return Err(Error::InvalidInput("entityId cannot be empty".into()));
        }
        if let Some(coordinates) = &self.coordinates
            && !coordinates.is_valid()
        {
            return Err(Error::InvalidInput(format!("{}: coordinates out of range", self.entity_id)));
        }
        if self.stable_id().is_none() && (self.coordinates.is_none() || self.name_hint().is_none()) {
            return Err(Error::InvalidInput(format!(
                "{}: requires stableExternalId or coordinates with displayNameHint",
                self.entity_id
            )));
        }
        Ok(())
    }
}

/// AI-generated descriptive content. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Insights {
    pub name: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    #[serde(deserialize_with = "text_or_list")]
    #[schemars(with = "Option<String>")]
    pub parking: Option<String>,
    pub sources: Option<Vec<String>>,
    #[serde(deserialize_with = "text_or_list")]
    #[schemars(with = "Option<String>")]
    pub accessibility: Option<String>,
    pub images: Option<Vec<String>>,
}

impl Insights {
    pub fn feature_count(&self) -> usize {
        self.features.as_ref().map_or(0, Vec::len)
    }
}

/// Provider-reported confidence that the content describes the right place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LocationConfidence {
    High,
    Medium,
    Low,
}

impl LocationConfidence {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// The provider's strict-JSON answer before scoring.
///
/// Unknown fields are ignored, so additions to the provider schema never
/// break parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawInsights {
    #[serde(flatten)]
    pub insights: Insights,
    pub location_confidence: Option<String>,
    pub location_verification: Option<String>,
}

impl RawInsights {
    pub fn confidence(&self) -> Option<LocationConfidence> {
        self.location_confidence.as_deref().and_then(LocationConfidence::parse)
    }
}

/// Coarse quality classification shown to end users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Neighborhood,
    Gem,
    Star,
}

/// How an entity's result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Served from cache.
    Cached,
    /// Fetched from the provider and accepted.
    Enriched,
    /// Fetched but scored below the accept threshold.
    Rejected,
    /// Provider call failed, timed out, or returned malformed content.
    Failed,
    /// The caller cancelled before the provider answered.
    Cancelled,
    /// Cache-only mode and no cached entry.
    NotCached,
}

/// Outcome for one entity of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    pub entity_id: String,
    pub insights: Option<Insights>,
    pub tier: Tier,
    pub tier_reasoning: String,
    pub status: EnrichmentStatus,
    /// Whether enrichment was attempted; callers should not retry these
    /// within the same session.
    pub attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreBreakdown>,
}

/// A single photo from image search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_page: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Accept either a string or a list of strings, joining lists with "; ".
fn text_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrList {
        Text(String),
        List(Vec<String>),
    }

    let value = Option::<TextOrList>::deserialize(deserializer)?;
    Ok(match value {
        Some(TextOrList::Text(text)) => Some(text),
        Some(TextOrList::List(items)) if !items.is_empty() => Some(items.join("; ")),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        let by_id = EnrichmentRequest {
            entity_id: "e1".into(),
            stable_external_id: Some("osm:way/1".into()),
            ..Default::default()
        };
        assert!(by_id.validate().is_ok());

        let by_location = EnrichmentRequest {
            entity_id: "e2".into(),
            coordinates: Some(Coordinates { lat: 37.76, lon: -122.43 }),
            display_name_hint: Some("Dolores Park".into()),
            ..Default::default()
        };
        assert!(by_location.validate().is_ok());

        let coordinates_only = EnrichmentRequest {
            entity_id: "e3".into(),
            coordinates: Some(Coordinates { lat: 37.76, lon: -122.43 }),
            ..Default::default()
        };
        assert!(coordinates_only.validate().is_err());

        let out_of_range = EnrichmentRequest {
            coordinates: Some(Coordinates { lat: 91.0, lon: 0.0 }),
            ..by_id.clone()
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_raw_insights_lenient_parsing() {
        let json = r#"{
            "name": "Dolores Park Playground",
            "description": "Big playground.",
            "features": ["swings"],
            "accessibility": ["ramps", "rubber surfacing"],
            "parking": "Street parking",
            "locationConfidence": "HIGH",
            "locationVerification": "Matches the park address on sfrecpark.org",
            "someFutureField": {"nested": true}
        }"#;
        let raw: RawInsights = serde_json::from_str(json).unwrap();
        assert_eq!(raw.insights.accessibility.as_deref(), Some("ramps; rubber surfacing"));
        assert_eq!(raw.insights.parking.as_deref(), Some("Street parking"));
        assert_eq!(raw.confidence(), Some(LocationConfidence::High));
        assert!(raw.insights.sources.is_none());
    }

    #[test]
    fn test_insights_all_fields_optional() {
        let insights: Insights = serde_json::from_str("{}").unwrap();
        assert_eq!(insights, Insights::default());
        assert_eq!(insights.feature_count(), 0);
        assert!(insights.sources.is_none());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Star > Tier::Gem);
        assert!(Tier::Gem > Tier::Neighborhood);
        assert_eq!(Tier::default(), Tier::Neighborhood);
        assert_eq!(serde_json::to_string(&Tier::Gem).unwrap(), "\"gem\"");
    }
}
