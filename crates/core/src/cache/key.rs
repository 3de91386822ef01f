//! Versioned cache key construction.
//!
//! Keys have the shape `{version}:{identity}`. The identity is a stable
//! external id when one exists, otherwise `name-{city|region|country}`
//! using the first location part that is available. A name alone is not an
//! identity: same-named playgrounds in different places must not collide.

use serde::{Deserialize, Serialize};

/// The identifying facts about an entity that a cache key may be built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIdentity {
    pub stable_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl EntityIdentity {
    pub fn from_stable_id(id: impl Into<String>) -> Self {
        Self { stable_id: Some(id.into()), ..Default::default() }
    }
}

/// Builds cache keys under a single schema-generation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    version: String,
}

impl CacheKeyBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into() }
    }

    /// Prefix shared by every key minted under this version.
    pub fn namespace(&self) -> String {
        format!("{}:", self.version)
    }

    /// Build the key for an entity.
    ///
    /// Returns `None` when the identity has no stable id and lacks either a
    /// name or any location part, in which case the entity cannot be cached.
    pub fn key_for(&self, identity: &EntityIdentity) -> Option<String> {
        if let Some(id) = non_blank(identity.stable_id.as_deref()) {
            return Some(self.with_stable_id(id));
        }

        let name = non_blank(identity.name.as_deref())?;
        let place = [&identity.city, &identity.region, &identity.country]
            .into_iter()
            .find_map(|part| non_blank(part.as_deref()))?;

        Some(format!("{}:{}-{}", self.version, normalize(name), normalize(place)))
    }

    pub fn with_stable_id(&self, stable_id: &str) -> String {
        format!("{}:{}", self.version, stable_id.trim())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize(part: &str) -> String {
    part.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composite(name: &str, city: Option<&str>, region: Option<&str>, country: Option<&str>) -> EntityIdentity {
        EntityIdentity {
            stable_id: None,
            name: Some(name.into()),
            city: city.map(Into::into),
            region: region.map(Into::into),
            country: country.map(Into::into),
        }
    }

    #[test]
    fn test_stable_id_key_is_deterministic() {
        let keys = CacheKeyBuilder::new("v3");
        let identity = EntityIdentity::from_stable_id("osm:way/123456");
        assert_eq!(keys.key_for(&identity), keys.key_for(&identity));
        assert_eq!(keys.key_for(&identity).unwrap(), "v3:osm:way/123456");
    }

    #[test]
    fn test_stable_id_preferred_over_composite() {
        let keys = CacheKeyBuilder::new("v3");
        let identity = EntityIdentity {
            stable_id: Some("osm:node/9".into()),
            ..composite("Dolores Park", Some("San Francisco"), None, None)
        };
        assert_eq!(keys.key_for(&identity).unwrap(), "v3:osm:node/9");
    }

    #[test]
    fn test_version_bump_changes_key() {
        let identity = EntityIdentity::from_stable_id("osm:way/1");
        let old = CacheKeyBuilder::new("v1").key_for(&identity);
        let new = CacheKeyBuilder::new("v2").key_for(&identity);
        assert_ne!(old, new);
    }

    #[test]
    fn test_composite_uses_first_available_place() {
        let keys = CacheKeyBuilder::new("v1");
        let with_city = composite("Dolores Park", Some("San Francisco"), Some("California"), Some("USA"));
        assert_eq!(keys.key_for(&with_city).unwrap(), "v1:dolores park-san francisco");

        let region_only = composite("Dolores Park", None, Some("California"), Some("USA"));
        assert_eq!(keys.key_for(&region_only).unwrap(), "v1:dolores park-california");

        let country_only = composite("Dolores Park", Some("  "), None, Some("USA"));
        assert_eq!(keys.key_for(&country_only).unwrap(), "v1:dolores park-usa");
    }

    #[test]
    fn test_composite_normalizes_spacing_and_case() {
        let keys = CacheKeyBuilder::new("v1");
        let a = composite("  Dolores   PARK ", Some("San Francisco"), None, None);
        let b = composite("dolores park", Some("san  francisco"), None, None);
        assert_eq!(keys.key_for(&a), keys.key_for(&b));
    }

    #[test]
    fn test_no_identity_yields_no_key() {
        let keys = CacheKeyBuilder::new("v1");
        assert!(keys.key_for(&EntityIdentity::default()).is_none());
        let blank = EntityIdentity { stable_id: Some(" ".into()), city: Some("Oakland".into()), ..Default::default() };
        assert!(keys.key_for(&blank).is_none());
    }

    #[test]
    fn test_name_without_place_yields_no_key() {
        let keys = CacheKeyBuilder::new("v1");
        assert!(keys.key_for(&composite("Central Park Playground", None, None, None)).is_none());
        assert!(keys.key_for(&composite("Central Park Playground", Some(" "), Some(""), None)).is_none());
    }

    #[test]
    fn test_namespace_prefix() {
        let keys = CacheKeyBuilder::new("v9");
        assert_eq!(keys.namespace(), "v9:");
        let key = keys.with_stable_id("abc");
        assert!(key.starts_with(&keys.namespace()));
    }
}
