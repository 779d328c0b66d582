pub mod context;
pub mod engine;
pub mod registry;
pub mod rules;

pub use context::LiabilityContext;
pub use engine::{apportion, compute_liability, ApportionmentResult, PartyScore};
pub use registry::{validate_registry, AccessType, ModelEntry, ModelRegistry, FALLBACK_MODEL};
pub use rules::{evaluate, FactorBreakdown, FactorRule, FactorScore, Tier};
