use serde::{Deserialize, Serialize};

/// Immutable fact record assembled by the caller before scoring.
///
/// Every field has a conservative (low-liability) default so a partially
/// filled context is always scoreable. Numeric fields are assumed
/// non-negative; upstream input handling is responsible for that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiabilityContext {
    /// Provenance/watermark metadata was removed before distribution
    pub disclosure_stripped: bool,

    /// Content was shared beyond private viewing
    pub content_distributed: bool,

    /// Content depicts a non-consenting identifiable person
    pub victim_impersonated: bool,

    /// Uploader has prior violations
    pub repeat_offender: bool,

    /// Distribution platform. Unrecognized names fall back to the
    /// worst-case platform profile; matching is case-sensitive and exact.
    pub platform_name: String,

    /// A takedown request was filed with the platform
    pub takedown_requested: bool,

    /// Hours the platform took to act after the request.
    /// Meaningless when no request was filed.
    pub response_hours: f64,

    /// Approximate number of people exposed to the content
    pub estimated_reach: u64,

    /// Generative model identifier, resolved against the model registry
    pub model_name: String,
}

impl Default for LiabilityContext {
    fn default() -> Self {
        Self {
            disclosure_stripped: false,
            content_distributed: false,
            victim_impersonated: false,
            repeat_offender: false,
            platform_name: "Other".to_string(),
            takedown_requested: false,
            response_hours: 999.0,
            estimated_reach: 0,
            model_name: "Unknown Model".to_string(),
        }
    }
}
