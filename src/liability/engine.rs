use serde::{Deserialize, Serialize};

use super::context::LiabilityContext;
use super::registry::{AccessType, ModelEntry, ModelRegistry};
use super::rules::{evaluate, FactorBreakdown, FactorRule, Tier};

/// User (uploader/distributor) rule table.
///
/// `intent` treats concealment as worse than mere distribution, so
/// stripping disclosure metadata outranks distributing.
pub const USER_RULES: [FactorRule<LiabilityContext>; 4] = [
    FactorRule {
        name: "intent",
        max_points: 0.35,
        legal_basis: "IPC §66E / IT Act §72A",
        tiers: &[
            Tier { applies: |c: &LiabilityContext| c.disclosure_stripped, points: 0.35 },
            Tier { applies: |c: &LiabilityContext| c.content_distributed, points: 0.20 },
        ],
        baseline: 0.05,
    },
    FactorRule {
        name: "action",
        max_points: 0.30,
        legal_basis: "IPC §500 / Defamation Act",
        tiers: &[
            Tier {
                applies: |c: &LiabilityContext| c.content_distributed && c.disclosure_stripped,
                points: 0.30,
            },
            Tier { applies: |c: &LiabilityContext| c.content_distributed, points: 0.15 },
        ],
        baseline: 0.05,
    },
    FactorRule {
        name: "consent",
        max_points: 0.20,
        legal_basis: "IT Act §43A",
        tiers: &[
            Tier { applies: |c: &LiabilityContext| c.victim_impersonated, points: 0.20 },
        ],
        baseline: 0.00,
    },
    FactorRule {
        name: "prior_offences",
        max_points: 0.15,
        legal_basis: "CrPC §110 / Repeat Offender doctrine",
        tiers: &[
            Tier { applies: |c: &LiabilityContext| c.repeat_offender, points: 0.15 },
        ],
        // Never exactly zero: baseline risk floor
        baseline: 0.02,
    },
];

/// Platform rule table. Platform name matching is case-sensitive and
/// exact; anything unrecognized is treated as the weakest-moderation,
/// maximum-erosion profile.
pub const PLATFORM_RULES: [FactorRule<LiabilityContext>; 4] = [
    FactorRule {
        name: "detection_capability",
        max_points: 0.25,
        legal_basis: "IT Rules 2021 Rule 4(4)",
        tiers: &[
            Tier { applies: |c: &LiabilityContext| c.platform_name == "YouTube", points: 0.05 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "Instagram", points: 0.10 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "WhatsApp", points: 0.20 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "Telegram", points: 0.25 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "X", points: 0.15 },
        ],
        baseline: 0.25,
    },
    FactorRule {
        name: "response_time",
        max_points: 0.35,
        legal_basis: "IT Rules 2021 Rule 4(1)(d) — 36h takedown",
        tiers: &[
            // No fault for inaction on an unmade request
            Tier { applies: |c: &LiabilityContext| !c.takedown_requested, points: 0.00 },
            Tier { applies: |c: &LiabilityContext| c.response_hours <= 12.0, points: 0.00 },
            Tier { applies: |c: &LiabilityContext| c.response_hours <= 24.0, points: 0.10 },
            Tier { applies: |c: &LiabilityContext| c.response_hours <= 36.0, points: 0.20 },
        ],
        baseline: 0.35,
    },
    FactorRule {
        name: "amplification",
        max_points: 0.25,
        legal_basis: "EU DSA Art. 34 — Systemic risk",
        tiers: &[
            Tier { applies: |c: &LiabilityContext| c.estimated_reach < 1_000, points: 0.05 },
            Tier { applies: |c: &LiabilityContext| c.estimated_reach < 100_000, points: 0.15 },
        ],
        baseline: 0.25,
    },
    FactorRule {
        name: "safe_harbor_erosion",
        max_points: 0.15,
        legal_basis: "IT Act §79 Safe Harbor conditions",
        tiers: &[
            Tier { applies: |c: &LiabilityContext| c.platform_name == "YouTube", points: 0.00 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "Instagram", points: 0.00 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "WhatsApp", points: 0.07 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "Telegram", points: 0.10 },
            Tier { applies: |c: &LiabilityContext| c.platform_name == "X", points: 0.05 },
        ],
        baseline: 0.15,
    },
];

/// Architect (model provenance) rule table, evaluated against the
/// registry entry the context's model name resolves to.
///
/// `safeguards` deliberately does not reward a content filter without a
/// watermark; that asymmetry comes from the source rule set and is kept
/// as-is.
pub const ARCHITECT_RULES: [FactorRule<ModelEntry>; 3] = [
    FactorRule {
        name: "safeguards",
        max_points: 0.40,
        legal_basis: "EU AI Act Art. 9 — Risk management",
        tiers: &[
            Tier {
                applies: |e: &ModelEntry| e.has_watermark && e.has_content_filter,
                points: 0.00,
            },
            Tier { applies: |e: &ModelEntry| e.has_watermark, points: 0.15 },
        ],
        baseline: 0.40,
    },
    FactorRule {
        name: "access_control",
        max_points: 0.30,
        legal_basis: "EU AI Act Art. 13 — Transparency",
        tiers: &[
            Tier {
                applies: |e: &ModelEntry| e.access_type == AccessType::ApiGatedWithIdentity,
                points: 0.00,
            },
            Tier {
                applies: |e: &ModelEntry| e.access_type == AccessType::ApiGatedBasic,
                points: 0.10,
            },
        ],
        // Open-source and anything unrecognized: maximally open
        baseline: 0.30,
    },
    FactorRule {
        name: "incident_history",
        max_points: 0.30,
        legal_basis: "Product Liability — negligent design",
        tiers: &[
            Tier { applies: |e: &ModelEntry| e.known_incidents == 0, points: 0.00 },
            Tier { applies: |e: &ModelEntry| e.known_incidents <= 10, points: 0.10 },
            Tier { applies: |e: &ModelEntry| e.known_incidents <= 50, points: 0.20 },
        ],
        baseline: 0.30,
    },
];

/// One party's share of the apportionment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartyScore {
    /// Integer percentage in [0, 100]
    pub percentage: u8,
    /// Unnormalized factor sum, rounded to 4 decimals
    pub raw_score: f64,
    pub factors: FactorBreakdown,
    pub explanation: String,
}

impl PartyScore {
    fn new(label: &str, percentage: u8, raw_score: f64, factors: FactorBreakdown) -> Self {
        let explanation = explain(label, percentage, raw_score, &factors);
        Self {
            percentage,
            raw_score: round4(raw_score),
            factors,
            explanation,
        }
    }
}

/// Liability split across the three parties. Percentages always sum to
/// exactly 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApportionmentResult {
    pub user: PartyScore,
    pub platform: PartyScore,
    pub architect: PartyScore,
}

impl ApportionmentResult {
    /// Parties with display labels, in fixed order (for tables).
    pub fn parties(&self) -> [(&'static str, &PartyScore); 3] {
        [
            ("User / Distributor", &self.user),
            ("Platform", &self.platform),
            ("AI Architect", &self.architect),
        ]
    }
}

/// The sole entry point: score a context against a registry.
///
/// Pure and total; every input has a safe default or fallback, so this
/// never fails. Safe to call concurrently with a shared registry
/// reference.
pub fn compute_liability(ctx: &LiabilityContext, registry: &ModelRegistry) -> ApportionmentResult {
    let entry = registry.resolve(&ctx.model_name);

    let (raw_user, user_factors) = evaluate(&USER_RULES, ctx);
    let (raw_platform, platform_factors) = evaluate(&PLATFORM_RULES, ctx);
    let (raw_architect, architect_factors) = evaluate(&ARCHITECT_RULES, entry);

    let (user_pct, platform_pct, architect_pct) = apportion(raw_user, raw_platform, raw_architect);

    ApportionmentResult {
        user: PartyScore::new("User", user_pct, raw_user, user_factors),
        platform: PartyScore::new("Platform", platform_pct, raw_platform, platform_factors),
        architect: PartyScore::new("AI Architect", architect_pct, raw_architect, architect_factors),
    }
}

/// Convert three raw scores into integer percentages summing to exactly
/// 100. User and platform round half-to-even; architect takes the
/// remainder, absorbing all rounding residue. The ordering is fixed for
/// reproducible output.
///
/// Half-to-even matters when the architect score is zero and the two
/// live shares land on exact halves (62.5 / 37.5): rounding both halves
/// away from zero would overdraw the remainder. With half-to-even, two
/// halves summing to 100 have floors of opposite parity, so exactly one
/// rounds up. The `min` guard keeps the remainder non-negative even if
/// float noise nudges both shares past a half.
///
/// The zero-total branch is kept even though the default tables carry
/// non-zero floors (`prior_offences` never drops below 0.02), so a zero
/// total cannot arise from `compute_liability` itself.
pub fn apportion(raw_user: f64, raw_platform: f64, raw_architect: f64) -> (u8, u8, u8) {
    let total = raw_user + raw_platform + raw_architect;
    if total == 0.0 {
        return (33, 33, 34);
    }

    let user_pct = round_half_even(raw_user / total * 100.0);
    let platform_pct = round_half_even(raw_platform / total * 100.0).min(100 - user_pct);
    let architect_pct = 100 - user_pct - platform_pct;

    (user_pct as u8, platform_pct as u8, architect_pct as u8)
}

/// Round a non-negative value half-to-even (banker's rounding).
fn round_half_even(value: f64) -> i64 {
    let floor = value.floor();
    if value - floor == 0.5 {
        let floor = floor as i64;
        if floor % 2 == 0 {
            floor
        } else {
            floor + 1
        }
    } else {
        value.round() as i64
    }
}

/// One-sentence audit line naming the dominant factor and its citation.
fn explain(label: &str, percentage: u8, raw_score: f64, factors: &FactorBreakdown) -> String {
    match factors.dominant() {
        Some(top) => format!(
            "{} bears {}% liability (raw score {:.3}). Primary driver: {} ({:.2}/{:.2} pts). Legal basis: {}.",
            label, percentage, raw_score, top.name, top.points, top.max_points, top.legal_basis
        ),
        None => format!(
            "{} bears {}% liability (raw score {:.3}).",
            label, percentage, raw_score
        ),
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liability::registry::FALLBACK_MODEL;

    fn registry() -> ModelRegistry {
        ModelRegistry::builtin()
    }

    fn ctx() -> LiabilityContext {
        LiabilityContext::default()
    }

    fn worst_case_ctx() -> LiabilityContext {
        LiabilityContext {
            disclosure_stripped: true,
            content_distributed: true,
            victim_impersonated: true,
            repeat_offender: true,
            platform_name: "Telegram".to_string(),
            takedown_requested: true,
            response_hours: 48.0,
            estimated_reach: 200_000,
            model_name: FALLBACK_MODEL.to_string(),
        }
    }

    #[test]
    fn test_worked_example() {
        // Worst-case uploader on Telegram with a 48h takedown and an
        // unregistered model: 1.00 / 0.95 / 0.70 raw, 38/36/26 split.
        let result = compute_liability(&worst_case_ctx(), &registry());

        assert!((result.user.raw_score - 1.00).abs() < 1e-9);
        assert!((result.platform.raw_score - 0.95).abs() < 1e-9);
        assert!((result.architect.raw_score - 0.70).abs() < 1e-9);

        assert_eq!(result.user.percentage, 38);
        assert_eq!(result.platform.percentage, 36);
        assert_eq!(result.architect.percentage, 26);
    }

    #[test]
    fn test_percentages_sum_to_100_across_grid() {
        let registry = registry();
        let platforms = ["YouTube", "Instagram", "WhatsApp", "Telegram", "X", "Other"];
        let models = ["DALL-E 3", "Stable Diffusion", "Midjourney", "no such model"];

        for stripped in [false, true] {
            for distributed in [false, true] {
                for impersonated in [false, true] {
                    for repeat in [false, true] {
                        for platform in platforms {
                            for model in models {
                                let ctx = LiabilityContext {
                                    disclosure_stripped: stripped,
                                    content_distributed: distributed,
                                    victim_impersonated: impersonated,
                                    repeat_offender: repeat,
                                    platform_name: platform.to_string(),
                                    takedown_requested: true,
                                    response_hours: 30.0,
                                    estimated_reach: 5_000,
                                    model_name: model.to_string(),
                                };
                                let result = compute_liability(&ctx, &registry);
                                let sum = result.user.percentage as u32
                                    + result.platform.percentage as u32
                                    + result.architect.percentage as u32;
                                assert_eq!(sum, 100, "split must sum to 100 for {:?}", ctx);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_all_factor_points_within_bounds() {
        let registry = registry();
        for ctx in [ctx(), worst_case_ctx()] {
            let result = compute_liability(&ctx, &registry);
            for (_, party) in result.parties() {
                for factor in party.factors.iter() {
                    assert!(
                        factor.points >= 0.0 && factor.points <= factor.max_points,
                        "factor {} out of bounds: {} (max {})",
                        factor.name,
                        factor.points,
                        factor.max_points
                    );
                }
            }
        }
    }

    #[test]
    fn test_degenerate_context_still_sums_to_100() {
        // All booleans false, unknown platform, zero reach, all-zero
        // registry entry. The unknown-platform and open-access defaults
        // are non-zero, so this exercises the normal branch.
        let ctx = LiabilityContext {
            platform_name: "UnheardOfApp".to_string(),
            ..LiabilityContext::default()
        };
        let result = compute_liability(&ctx, &registry());

        assert!((result.user.raw_score - 0.12).abs() < 1e-9);
        assert!((result.platform.raw_score - 0.45).abs() < 1e-9);
        assert!((result.architect.raw_score - 0.70).abs() < 1e-9);
        let sum = result.user.percentage as u32
            + result.platform.percentage as u32
            + result.architect.percentage as u32;
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_zero_total_fallback_split() {
        // Unreachable from compute_liability with the default tables
        // (prior_offences floors at 0.02), so invoke the branch directly.
        assert_eq!(apportion(0.0, 0.0, 0.0), (33, 33, 34));
    }

    #[test]
    fn test_architect_absorbs_rounding_residue() {
        // 1/3 each would naively round to 33+33+33 = 99
        let (u, p, a) = apportion(1.0, 1.0, 1.0);
        assert_eq!((u, p, a), (33, 33, 34));
        assert_eq!(u as u32 + p as u32 + a as u32, 100);
    }

    #[test]
    fn test_apportion_half_shares_round_to_even() {
        // Shares of exactly 62.5 / 37.5 / 0: one half rounds down, one
        // up, and the architect remainder stays at 0 instead of going
        // negative.
        assert_eq!(apportion(5.0, 3.0, 0.0), (62, 38, 0));
        // 12.5 / 12.5 / 75: both halves have even floors and round down
        assert_eq!(apportion(1.0, 1.0, 6.0), (12, 12, 76));
    }

    #[test]
    fn test_zero_architect_score_keeps_split_in_range() {
        // Worst-case uploader on Instagram with a slow takedown against
        // a fully safeguarded model: 1.00 / 0.60 / 0.00 raw puts both
        // live shares on an exact half.
        let mut entries = std::collections::HashMap::new();
        entries.insert(
            "Locked Down".to_string(),
            ModelEntry {
                has_watermark: true,
                has_content_filter: true,
                access_type: AccessType::ApiGatedWithIdentity,
                known_incidents: 0,
            },
        );
        let registry = ModelRegistry::new(entries);
        let ctx = LiabilityContext {
            disclosure_stripped: true,
            content_distributed: true,
            victim_impersonated: true,
            repeat_offender: true,
            platform_name: "Instagram".to_string(),
            takedown_requested: true,
            response_hours: 48.0,
            estimated_reach: 5_000,
            model_name: "Locked Down".to_string(),
        };
        let result = compute_liability(&ctx, &registry);

        assert_eq!(result.user.percentage, 62);
        assert_eq!(result.platform.percentage, 38);
        assert_eq!(result.architect.percentage, 0);
        let sum = result.user.percentage as u32
            + result.platform.percentage as u32
            + result.architect.percentage as u32;
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_dominant_factor_consent() {
        // consent forced to max, everything else at minimum
        let ctx = LiabilityContext {
            victim_impersonated: true,
            ..LiabilityContext::default()
        };
        let result = compute_liability(&ctx, &registry());
        let dominant = result.user.factors.dominant().unwrap();
        assert_eq!(dominant.name, "consent");
        assert!(result.user.explanation.contains("Primary driver: consent (0.20/0.20 pts)"));
        assert!(result.user.explanation.contains("Legal basis: IT Act §43A."));
    }

    #[test]
    fn test_explanation_format() {
        let result = compute_liability(&worst_case_ctx(), &registry());
        assert_eq!(
            result.user.explanation,
            "User bears 38% liability (raw score 1.000). Primary driver: intent \
             (0.35/0.35 pts). Legal basis: IPC §66E / IT Act §72A."
        );
        assert!(result.architect.explanation.starts_with("AI Architect bears 26%"));
    }

    #[test]
    fn test_unknown_model_fallback_idempotent() {
        let registry = registry();
        let named = LiabilityContext {
            model_name: "definitely not registered".to_string(),
            ..LiabilityContext::default()
        };
        let fallback = LiabilityContext {
            model_name: FALLBACK_MODEL.to_string(),
            ..LiabilityContext::default()
        };
        let a = compute_liability(&named, &registry);
        let b = compute_liability(&fallback, &registry);
        assert_eq!(a.architect.raw_score, b.architect.raw_score);
        assert_eq!(a.architect.factors, b.architect.factors);
        assert_eq!(a.architect.percentage, b.architect.percentage);
    }

    #[test]
    fn test_platform_lookup_exact_match_only() {
        // Trailing whitespace must fall into the unrecognized-platform path
        let near_miss = LiabilityContext {
            platform_name: "Telegram ".to_string(),
            ..LiabilityContext::default()
        };
        let (_, factors) = evaluate(&PLATFORM_RULES, &near_miss);
        assert_eq!(factors.get("detection_capability").unwrap().points, 0.25);
        assert_eq!(factors.get("safe_harbor_erosion").unwrap().points, 0.15);

        let exact = LiabilityContext {
            platform_name: "Telegram".to_string(),
            ..LiabilityContext::default()
        };
        let (_, factors) = evaluate(&PLATFORM_RULES, &exact);
        assert_eq!(factors.get("safe_harbor_erosion").unwrap().points, 0.10);
    }

    #[test]
    fn test_response_time_brackets() {
        let case = |requested: bool, hours: f64| {
            let ctx = LiabilityContext {
                takedown_requested: requested,
                response_hours: hours,
                ..LiabilityContext::default()
            };
            let (_, factors) = evaluate(&PLATFORM_RULES, &ctx);
            factors.get("response_time").unwrap().points
        };

        // No request filed: no fault regardless of hours
        assert_eq!(case(false, 500.0), 0.00);

        // Boundaries inclusive on the lower side of each bracket
        assert_eq!(case(true, 12.0), 0.00);
        assert_eq!(case(true, 12.5), 0.10);
        assert_eq!(case(true, 24.0), 0.10);
        assert_eq!(case(true, 24.5), 0.20);
        assert_eq!(case(true, 36.0), 0.20);
        assert_eq!(case(true, 36.5), 0.35);
        assert_eq!(case(true, 999.0), 0.35);
    }

    #[test]
    fn test_amplification_brackets() {
        let case = |reach: u64| {
            let ctx = LiabilityContext {
                estimated_reach: reach,
                ..LiabilityContext::default()
            };
            let (_, factors) = evaluate(&PLATFORM_RULES, &ctx);
            factors.get("amplification").unwrap().points
        };

        assert_eq!(case(0), 0.05);
        assert_eq!(case(999), 0.05);
        assert_eq!(case(1_000), 0.15);
        assert_eq!(case(99_999), 0.15);
        assert_eq!(case(100_000), 0.25);
    }

    #[test]
    fn test_safeguards_asymmetry_preserved() {
        // A content filter without a watermark scores the same as having
        // neither. Intentional in the source rule set.
        let filter_only = ModelEntry {
            has_watermark: false,
            has_content_filter: true,
            access_type: AccessType::OpenSource,
            known_incidents: 0,
        };
        let neither = ModelEntry {
            has_content_filter: false,
            ..filter_only.clone()
        };
        let watermark_only = ModelEntry {
            has_watermark: true,
            has_content_filter: false,
            ..filter_only.clone()
        };

        let points = |e: &ModelEntry| {
            let (_, factors) = evaluate(&ARCHITECT_RULES, e);
            factors.get("safeguards").unwrap().points
        };

        assert_eq!(points(&filter_only), 0.40);
        assert_eq!(points(&neither), 0.40);
        assert_eq!(points(&watermark_only), 0.15);
    }

    #[test]
    fn test_incident_history_brackets() {
        let case = |incidents: u64| {
            let entry = ModelEntry {
                known_incidents: incidents,
                ..ModelEntry::fallback()
            };
            let (_, factors) = evaluate(&ARCHITECT_RULES, &entry);
            factors.get("incident_history").unwrap().points
        };

        assert_eq!(case(0), 0.00);
        assert_eq!(case(1), 0.10);
        assert_eq!(case(10), 0.10);
        assert_eq!(case(11), 0.20);
        assert_eq!(case(50), 0.20);
        assert_eq!(case(51), 0.30);
    }

    #[test]
    fn test_fully_safeguarded_model_scores_zero() {
        let entry = ModelEntry {
            has_watermark: true,
            has_content_filter: true,
            access_type: AccessType::ApiGatedWithIdentity,
            known_incidents: 0,
        };
        let (raw, _) = evaluate(&ARCHITECT_RULES, &entry);
        assert_eq!(raw, 0.0);
    }

    #[test]
    fn test_deterministic_output() {
        let registry = registry();
        let ctx = worst_case_ctx();
        let a = compute_liability(&ctx, &registry);
        let b = compute_liability(&ctx, &registry);
        assert_eq!(a, b);
    }

    #[test]
    fn test_raw_score_rounded_to_4_decimals() {
        let result = compute_liability(&ctx(), &registry());
        for (_, party) in result.parties() {
            let rescaled = party.raw_score * 10_000.0;
            assert!((rescaled - rescaled.round()).abs() < 1e-6);
        }
    }
}
