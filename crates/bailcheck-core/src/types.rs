//! Shared types for rule lookup and bail evaluation.
//!
//! Field names serialize in camelCase so that analyses and verdicts can be
//! stored on case documents and returned to clients without a mapping layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bailability category of a statute section.
///
/// Unknown labels (e.g. "Depends", "Depends on main offense") are kept
/// verbatim so they round-trip through storage unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Bailable,
    NonBailable,
    Other(String),
}

impl Category {
    /// The label as stored in the rule table.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Bailable => "Bailable",
            Category::NonBailable => "Non-Bailable",
            Category::Other(label) => label,
        }
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Bailable" => Category::Bailable,
            "Non-Bailable" => Category::NonBailable,
            _ => Category::Other(label),
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::from(label.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level of a statute section.
///
/// `Low < Medium < High` is an explicit ordinal (see [`RiskLevel::rank`]).
/// Non-standard markers such as "Variable" rank with `Low` and therefore
/// never raise an aggregated maximum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unrated(String),
}

impl RiskLevel {
    /// Ordinal used for aggregation.
    pub fn rank(&self) -> u8 {
        match self {
            RiskLevel::Low | RiskLevel::Unrated(_) => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Unrated(marker) => marker,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, RiskLevel::Unrated(_))
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Low" => RiskLevel::Low,
            "Medium" => RiskLevel::Medium,
            "High" => RiskLevel::High,
            _ => RiskLevel::Unrated(label),
        }
    }
}

impl From<&str> for RiskLevel {
    fn from(label: &str) -> Self {
        RiskLevel::from(label.to_string())
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Unrated(marker) => marker,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static reference record for one statute section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalRule {
    /// Section identifier (e.g., "302", "498A")
    pub section: String,

    /// Statute family (e.g., "IPC")
    #[serde(rename = "type")]
    pub statute: String,

    /// Short offense label
    pub offense: String,

    pub category: Category,

    pub risk_level: RiskLevel,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punishment: Option<String>,
}

/// Aggregated lookup result for a case's sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalAnalysis {
    /// Rules matching the extracted IPC sections, ordered by section number
    pub matched_rules: Vec<LegalRule>,

    /// Category of each matched rule, parallel to `matched_rules`
    pub categories: Vec<Category>,

    /// Highest standard risk level among matched rules
    pub max_risk_level: RiskLevel,

    /// Extracted IPC section numbers
    pub ipc_sections: Vec<String>,

    /// Extracted CrPC section numbers (not used in evaluation)
    pub crpc_sections: Vec<String>,
}

/// Bail eligibility outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eligibility {
    #[serde(rename = "Eligible")]
    Eligible,
    #[serde(rename = "Not Eligible")]
    NotEligible,
    #[serde(rename = "Conditional")]
    Conditional,
}

impl Eligibility {
    /// The recommendation label paired with this outcome.
    pub fn recommendation(&self) -> Recommendation {
        match self {
            Eligibility::Eligible => Recommendation::BailRecommended,
            Eligibility::NotEligible => Recommendation::BailNotRecommended,
            Eligibility::Conditional => Recommendation::ConditionalBailRecommended,
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible => write!(f, "Eligible"),
            Eligibility::NotEligible => write!(f, "Not Eligible"),
            Eligibility::Conditional => write!(f, "Conditional"),
        }
    }
}

/// Human-readable recommendation, 1:1 with [`Eligibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Bail Recommended")]
    BailRecommended,
    #[serde(rename = "Bail Not Recommended")]
    BailNotRecommended,
    #[serde(rename = "Conditional Bail Recommended")]
    ConditionalBailRecommended,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::BailRecommended => write!(f, "Bail Recommended"),
            Recommendation::BailNotRecommended => write!(f, "Bail Not Recommended"),
            Recommendation::ConditionalBailRecommended => {
                write!(f, "Conditional Bail Recommended")
            }
        }
    }
}

/// The verdict produced by the bail evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BailEvaluation {
    pub eligibility: Eligibility,
    pub recommendation: Recommendation,
    /// Empty when eligibility is `Not Eligible`
    pub conditions: Vec<String>,
    /// Names the decision branch that fired
    pub reasoning: String,
}

/// Analysis plus verdict for one case, in the shape returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub legal_analysis: LegalAnalysis,
    pub bail_evaluation: BailEvaluation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip() {
        assert_eq!(Category::from("Bailable"), Category::Bailable);
        assert_eq!(Category::from("Non-Bailable"), Category::NonBailable);
        assert_eq!(
            Category::from("Depends"),
            Category::Other("Depends".to_string())
        );
        assert_eq!(String::from(Category::NonBailable), "Non-Bailable");
    }

    #[test]
    fn test_risk_rank_orders_standard_levels() {
        assert!(RiskLevel::Low.rank() < RiskLevel::Medium.rank());
        assert!(RiskLevel::Medium.rank() < RiskLevel::High.rank());
        assert_eq!(RiskLevel::from("Variable").rank(), RiskLevel::Low.rank());
        assert!(!RiskLevel::from("Variable").is_standard());
    }

    #[test]
    fn test_legal_rule_wire_names() {
        let rule = LegalRule {
            section: "302".to_string(),
            statute: "IPC".to_string(),
            offense: "Murder".to_string(),
            category: Category::NonBailable,
            risk_level: RiskLevel::High,
            description: "Punishment for murder".to_string(),
            punishment: None,
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["type"], "IPC");
        assert_eq!(value["category"], "Non-Bailable");
        assert_eq!(value["riskLevel"], "High");
        assert!(value.get("punishment").is_none());
    }

    #[test]
    fn test_eligibility_serializes_with_spaces() {
        let evaluation = BailEvaluation {
            eligibility: Eligibility::NotEligible,
            recommendation: Eligibility::NotEligible.recommendation(),
            conditions: vec![],
            reasoning: "test".to_string(),
        };
        let value = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(value["eligibility"], "Not Eligible");
        assert_eq!(value["recommendation"], "Bail Not Recommended");
    }
}
