use serde::{Deserialize, Serialize};

/// One rung of a factor's tier ladder. The first tier whose predicate
/// matches supplies the points; later tiers are not consulted.
pub struct Tier<I> {
    pub applies: fn(&I) -> bool,
    pub points: f64,
}

/// One named, capped contribution to a party's raw score.
///
/// All three party scorers are plain lists of these, evaluated uniformly:
/// walk the tier ladder in order, first match wins, otherwise fall back to
/// `baseline`. `baseline` is not always zero; some factors carry a risk
/// floor (e.g. `prior_offences` never scores below 0.02).
pub struct FactorRule<I: 'static> {
    pub name: &'static str,
    pub max_points: f64,
    pub legal_basis: &'static str,
    pub tiers: &'static [Tier<I>],
    pub baseline: f64,
}

impl<I: 'static> FactorRule<I> {
    pub fn points_for(&self, input: &I) -> f64 {
        self.tiers
            .iter()
            .find(|tier| (tier.applies)(input))
            .map(|tier| tier.points)
            .unwrap_or(self.baseline)
    }
}

/// A scored factor as it appears in the output breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorScore {
    pub name: String,
    pub points: f64,
    pub max_points: f64,
    pub legal_basis: String,
}

/// Per-party factor breakdown, in fixed enumeration order.
///
/// The order is load-bearing: dominant-factor ties are broken by the first
/// factor encountered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FactorBreakdown(pub Vec<FactorScore>);

impl FactorBreakdown {
    /// The factor with the strictly highest points. Ties go to the
    /// earlier factor in enumeration order.
    pub fn dominant(&self) -> Option<&FactorScore> {
        self.0.iter().fold(None, |best: Option<&FactorScore>, factor| {
            match best {
                Some(current) if factor.points > current.points => Some(factor),
                Some(current) => Some(current),
                None => Some(factor),
            }
        })
    }

    pub fn get(&self, name: &str) -> Option<&FactorScore> {
        self.0.iter().find(|factor| factor.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FactorScore> {
        self.0.iter()
    }
}

/// Evaluate a rule table against one input, producing the raw score
/// (sum of factor points) and the ordered breakdown.
pub fn evaluate<I: 'static>(rules: &[FactorRule<I>], input: &I) -> (f64, FactorBreakdown) {
    let mut factors = Vec::with_capacity(rules.len());
    let mut raw_score = 0.0;

    for rule in rules {
        let points = rule.points_for(input);
        raw_score += points;
        factors.push(FactorScore {
            name: rule.name.to_string(),
            points,
            max_points: rule.max_points,
            legal_basis: rule.legal_basis.to_string(),
        });
    }

    (raw_score, FactorBreakdown(factors))
}
