//! Bail evaluator: maps an aggregated analysis to a verdict.
//!
//! The evaluator applies a strict, ordered decision list. The first branch
//! whose guard holds wins; later branches are never consulted:
//! 1. Every category is Bailable → Eligible
//! 2. Any Non-Bailable and maximum risk High → Not Eligible
//! 3. Accused older than 60 → Conditional (senior-citizen terms)
//! 4. Any Non-Bailable and maximum risk below High → Conditional (surety terms)
//! 5. Otherwise → Conditional (mixed-offense terms)
//!
//! Age never overrides branch 2, and the senior-citizen and risk-based
//! condition sets are never merged.

use crate::types::{BailEvaluation, Category, Eligibility, RiskLevel};

/// Age above which the senior-citizen branch applies.
pub const SENIOR_CITIZEN_AGE: i64 = 60;

/// Inputs to the decision list.
#[derive(Debug, Clone, Copy)]
pub struct BailFacts<'a> {
    /// Accused's age in whole years, if known and well-formed
    pub age: Option<i64>,

    /// Category of each matched rule
    pub categories: &'a [Category],

    /// Highest standard risk among matched rules
    pub max_risk_level: &'a RiskLevel,
}

impl BailFacts<'_> {
    fn all_bailable(&self) -> bool {
        // Inherited behavior: an empty list is vacuously "all Bailable", so a
        // case with no matched sections is reported Eligible.
        self.categories.iter().all(|c| *c == Category::Bailable)
    }

    fn any_non_bailable(&self) -> bool {
        self.categories.contains(&Category::NonBailable)
    }

    fn high_risk(&self) -> bool {
        *self.max_risk_level == RiskLevel::High
    }

    fn senior_citizen(&self) -> bool {
        self.age.is_some_and(|age| age > SENIOR_CITIZEN_AGE)
    }
}

/// Branches of the decision list, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BailRule {
    AllBailable,
    HighRiskNonBailable,
    SeniorCitizen,
    ModerateRiskNonBailable,
    MixedOffenses,
}

type Guard = fn(&BailFacts<'_>) -> bool;

/// The decision list. `MixedOffenses` is the fallback and has no guard here.
const DECISION_LIST: [(BailRule, Guard); 4] = [
    (BailRule::AllBailable, |f| f.all_bailable()),
    (BailRule::HighRiskNonBailable, |f| {
        f.any_non_bailable() && f.high_risk()
    }),
    (BailRule::SeniorCitizen, |f| f.senior_citizen()),
    (BailRule::ModerateRiskNonBailable, |f| {
        f.any_non_bailable() && !f.high_risk()
    }),
];

impl BailRule {
    pub fn eligibility(&self) -> Eligibility {
        match self {
            BailRule::AllBailable => Eligibility::Eligible,
            BailRule::HighRiskNonBailable => Eligibility::NotEligible,
            BailRule::SeniorCitizen
            | BailRule::ModerateRiskNonBailable
            | BailRule::MixedOffenses => Eligibility::Conditional,
        }
    }

    pub fn conditions(&self) -> &'static [&'static str] {
        match self {
            BailRule::AllBailable => &[
                "Personal bond required",
                "Appear before court as required",
            ],
            BailRule::HighRiskNonBailable => &[],
            BailRule::SeniorCitizen => &[
                "Surety of Rs. 50,000 required",
                "Surrender passport",
                "Report to police station weekly",
                "Cannot leave city without permission",
            ],
            BailRule::ModerateRiskNonBailable => &[
                "Surety of Rs. 1,00,000 required",
                "Report to police station bi-weekly",
                "Travel restriction within district",
                "Cooperate with investigation",
            ],
            BailRule::MixedOffenses => &[
                "Personal bond with surety",
                "Regular reporting",
                "No tampering with evidence",
            ],
        }
    }

    pub fn reasoning(&self) -> &'static str {
        match self {
            BailRule::AllBailable => "All offenses are bailable in nature",
            BailRule::HighRiskNonBailable => {
                "Offense involves serious crime with high risk to society"
            }
            BailRule::SeniorCitizen => "Accused is senior citizen, eligible for conditional bail",
            BailRule::ModerateRiskNonBailable => {
                "Non-bailable offense but risk level permits conditional bail"
            }
            BailRule::MixedOffenses => {
                "Case involves mixed offenses, conditional bail may be granted"
            }
        }
    }

    /// Build the verdict for this branch.
    pub fn verdict(&self) -> BailEvaluation {
        let eligibility = self.eligibility();
        BailEvaluation {
            eligibility,
            recommendation: eligibility.recommendation(),
            conditions: self.conditions().iter().map(|c| c.to_string()).collect(),
            reasoning: self.reasoning().to_string(),
        }
    }
}

/// The BailEvaluator runs the decision list.
pub struct BailEvaluator;

impl BailEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Select the first branch whose guard holds.
    pub fn decide(&self, facts: &BailFacts<'_>) -> BailRule {
        DECISION_LIST
            .iter()
            .find(|(_, guard)| guard(facts))
            .map(|(rule, _)| *rule)
            .unwrap_or(BailRule::MixedOffenses)
    }

    /// Evaluate and build the verdict. Never fails.
    pub fn evaluate(
        &self,
        age: Option<i64>,
        categories: &[Category],
        max_risk_level: &RiskLevel,
    ) -> BailEvaluation {
        let facts = BailFacts {
            age,
            categories,
            max_risk_level,
        };
        let rule = self.decide(&facts);
        tracing::debug!(
            rule = ?rule,
            categories = categories.len(),
            max_risk = %max_risk_level,
            "Bail decision branch selected"
        );
        rule.verdict()
    }
}

impl Default for BailEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
