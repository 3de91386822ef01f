//! HTTP collaborators for swingset.
//!
//! Concrete implementations of the provider traits from `swingset-core`:
//! a Nominatim reverse geocoder, an OpenAI-compatible insight provider and
//! Brave image search.

pub mod brave;
pub mod error;
pub mod geocode;
pub mod insights;
pub mod throttle;
pub mod unconfigured;

pub use brave::{BraveClient, BraveConfig, ImageSearchRequest};
pub use error::ClientError;
pub use geocode::{GeocoderConfig, NominatimGeocoder};
pub use insights::{ChatInsightClient, InsightConfig};
pub use throttle::Throttle;
pub use unconfigured::Unconfigured;
