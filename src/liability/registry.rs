use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Name of the guaranteed fallback entry.
pub const FALLBACK_MODEL: &str = "Unknown Model";

/// How a generative model is distributed to end users.
///
/// Unknown values deserialize to `Unknown`, which scores the same as
/// `OpenSource` (treated as maximally open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    ApiGatedWithIdentity,
    ApiGatedBasic,
    OpenSource,
    #[serde(other)]
    Unknown,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::ApiGatedWithIdentity => "api_gated_with_identity",
            AccessType::ApiGatedBasic => "api_gated_basic",
            AccessType::OpenSource => "open_source",
            AccessType::Unknown => "unknown",
        }
    }
}

/// Capability metadata for one generative model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelEntry {
    pub has_watermark: bool,
    pub has_content_filter: bool,
    pub access_type: AccessType,
    pub known_incidents: u64,
}

impl ModelEntry {
    /// The worst-case profile used for unregistered models.
    pub fn fallback() -> Self {
        Self {
            has_watermark: false,
            has_content_filter: false,
            access_type: AccessType::OpenSource,
            known_incidents: 0,
        }
    }
}

/// Static reference data describing known generative-model safeguards,
/// keyed by model name. Loaded once at startup and passed by reference;
/// never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    entries: HashMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// Build a registry from raw entries. Inserts the "Unknown Model"
    /// fallback if the input lacks one, so `resolve` can never fail.
    pub fn new(mut entries: HashMap<String, ModelEntry>) -> Self {
        entries
            .entry(FALLBACK_MODEL.to_string())
            .or_insert_with(ModelEntry::fallback);
        Self { entries }
    }

    /// The registry shipped in the binary, used when no registry file is
    /// configured.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "DALL-E 3".to_string(),
            ModelEntry {
                has_watermark: true,
                has_content_filter: true,
                access_type: AccessType::ApiGatedWithIdentity,
                known_incidents: 2,
            },
        );
        entries.insert(
            "Midjourney".to_string(),
            ModelEntry {
                has_watermark: true,
                has_content_filter: false,
                access_type: AccessType::ApiGatedBasic,
                known_incidents: 12,
            },
        );
        entries.insert(
            "Stable Diffusion".to_string(),
            ModelEntry {
                has_watermark: false,
                has_content_filter: false,
                access_type: AccessType::OpenSource,
                known_incidents: 64,
            },
        );
        entries.insert(
            "ElevenLabs".to_string(),
            ModelEntry {
                has_watermark: false,
                has_content_filter: true,
                access_type: AccessType::ApiGatedBasic,
                known_incidents: 8,
            },
        );
        entries.insert(
            "Runway Gen-3".to_string(),
            ModelEntry {
                has_watermark: true,
                has_content_filter: true,
                access_type: AccessType::ApiGatedBasic,
                known_incidents: 1,
            },
        );
        Self::new(entries)
    }

    /// Load a registry from a JSON file mapping model name to entry.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model registry at {}", path.display()))?;
        let entries: HashMap<String, ModelEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model registry at {}", path.display()))?;
        Ok(Self::new(entries))
    }

    /// Look up a model by exact name, falling back to the "Unknown Model"
    /// entry. The constructor guarantees the fallback exists.
    pub fn resolve(&self, model_name: &str) -> &ModelEntry {
        self.entries
            .get(model_name)
            .or_else(|| self.entries.get(FALLBACK_MODEL))
            .expect("registry invariant: fallback entry always present")
    }

    /// Entries sorted by name, for listing.
    pub fn sorted_entries(&self) -> Vec<(&str, &ModelEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate a registry at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_registry(registry: &ModelRegistry) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if !registry
        .entries
        .contains_key(FALLBACK_MODEL)
    {
        errors.push(format!("registry: missing \"{}\" fallback entry", FALLBACK_MODEL));
    }

    for (name, _entry) in registry.sorted_entries() {
        if name.trim().is_empty() {
            errors.push("registry: model name must not be blank".to_string());
        } else if name != name.trim() {
            errors.push(format!(
                "registry.{}: model name has leading/trailing whitespace",
                name.trim()
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
