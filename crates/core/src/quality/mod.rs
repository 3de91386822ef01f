//! Content-quality checks for provider results.
//!
//! Validators and the scorer are pure and never fail: malformed or missing
//! input scores low instead of erroring.

pub mod description;
pub mod keywords;
pub mod scorer;
pub mod sources;
pub mod tier;

pub use description::{DescriptionValidation, validate_description};
pub use scorer::{Confidence, ScoreBreakdown, score_result};
pub use sources::{LocationTarget, SourceValidation, validate_sources};
pub use tier::calculate_tier;
