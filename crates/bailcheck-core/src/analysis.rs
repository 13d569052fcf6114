//! Rule lookup aggregation.
//!
//! Turns the rules matched for a case into the `LegalAnalysis` consumed by
//! the bail evaluator: the category of every match and the highest risk.

use crate::rules::RuleTable;
use crate::sections::{compare_sections, parse_sections};
use crate::types::{Category, LegalAnalysis, LegalRule, RiskLevel};

/// Highest standard risk level among `rules`.
///
/// Non-standard markers rank with `Low` and never raise the result.
/// Returns `Low` for an empty slice.
pub fn max_risk_level(rules: &[LegalRule]) -> RiskLevel {
    rules
        .iter()
        .map(|rule| &rule.risk_level)
        .filter(|level| level.is_standard())
        .max_by_key(|level| level.rank())
        .cloned()
        .unwrap_or(RiskLevel::Low)
}

impl LegalAnalysis {
    /// Aggregate matched rules.
    ///
    /// `matched_rules` is re-sorted by section number so the analysis does
    /// not depend on the order the store returned them in.
    pub fn from_matches(
        mut matched_rules: Vec<LegalRule>,
        ipc_sections: Vec<String>,
        crpc_sections: Vec<String>,
    ) -> Self {
        matched_rules.sort_by(|a, b| compare_sections(&a.section, &b.section));
        let categories: Vec<Category> = matched_rules
            .iter()
            .map(|rule| rule.category.clone())
            .collect();
        let max_risk_level = max_risk_level(&matched_rules);

        Self {
            matched_rules,
            categories,
            max_risk_level,
            ipc_sections,
            crpc_sections,
        }
    }

    /// Parse both section fields and resolve IPC sections against `rules`.
    ///
    /// CrPC sections are extracted for the record only; they are never
    /// looked up.
    pub fn from_text(rules: &RuleTable, ipc_text: Option<&str>, crpc_text: Option<&str>) -> Self {
        let ipc_sections = parse_sections(ipc_text);
        let crpc_sections = parse_sections(crpc_text);
        let matched = rules.lookup(&ipc_sections);
        Self::from_matches(matched, ipc_sections, crpc_sections)
    }

    pub fn has_matches(&self) -> bool {
        !self.matched_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rule(section: &str, category: &str, risk: &str) -> LegalRule {
        LegalRule {
            section: section.to_string(),
            statute: "IPC".to_string(),
            offense: format!("Offense {}", section),
            category: Category::from(category),
            risk_level: RiskLevel::from(risk),
            description: String::new(),
            punishment: None,
        }
    }

    #[test]
    fn test_no_matches_is_low() {
        let analysis = LegalAnalysis::from_matches(vec![], vec!["999".to_string()], vec![]);
        assert!(analysis.categories.is_empty());
        assert_eq!(analysis.max_risk_level, RiskLevel::Low);
        assert!(!analysis.has_matches());
    }

    #[test]
    fn test_max_risk_takes_highest() {
        let rules = vec![
            rule("323", "Bailable", "Low"),
            rule("302", "Non-Bailable", "High"),
            rule("420", "Bailable", "Medium"),
        ];
        assert_eq!(max_risk_level(&rules), RiskLevel::High);
    }

    #[test]
    fn test_variable_never_raises_max() {
        let rules = vec![rule("34", "Depends on main offense", "Variable")];
        assert_eq!(max_risk_level(&rules), RiskLevel::Low);

        let rules = vec![
            rule("34", "Depends on main offense", "Variable"),
            rule("420", "Bailable", "Medium"),
        ];
        assert_eq!(max_risk_level(&rules), RiskLevel::Medium);
    }

    #[test]
    fn test_categories_follow_section_order_with_duplicates() {
        let analysis = LegalAnalysis::from_matches(
            vec![
                rule("420", "Bailable", "Medium"),
                rule("302", "Non-Bailable", "High"),
                rule("379", "Bailable", "Low"),
            ],
            vec![],
            vec![],
        );
        assert_eq!(
            analysis.categories,
            vec![Category::NonBailable, Category::Bailable, Category::Bailable]
        );
    }

    #[test]
    fn test_from_text_ignores_crpc_for_lookup() {
        let table = RuleTable::builtin().unwrap();
        let analysis = LegalAnalysis::from_text(&table, Some("379"), Some("302, 41"));
        assert_eq!(analysis.ipc_sections, vec!["379"]);
        assert_eq!(analysis.crpc_sections, vec!["302", "41"]);
        assert_eq!(analysis.matched_rules.len(), 1);
        assert_eq!(analysis.matched_rules[0].section, "379");
    }

    #[test]
    fn test_from_text_suffixed_section_does_not_match() {
        let table = RuleTable::builtin().unwrap();
        // "498A" extracts as "498", which has no entry of its own
        let analysis = LegalAnalysis::from_text(&table, Some("498A, 323"), None);
        assert_eq!(analysis.ipc_sections, vec!["498", "323"]);
        let matched: Vec<&str> = analysis
            .matched_rules
            .iter()
            .map(|r| r.section.as_str())
            .collect();
        assert_eq!(matched, vec!["323"]);
    }

    fn risk_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Low".to_string()),
            Just("Medium".to_string()),
            Just("High".to_string()),
            Just("Variable".to_string()),
            "[a-z]{1,8}",
        ]
    }

    proptest! {
        #[test]
        fn prop_max_risk_dominates_standard_levels(risks in prop::collection::vec(risk_strategy(), 0..12)) {
            let rules: Vec<LegalRule> = risks
                .iter()
                .enumerate()
                .map(|(i, risk)| rule(&i.to_string(), "Bailable", risk))
                .collect();
            let max = max_risk_level(&rules);

            prop_assert!(max.is_standard());
            for r in &rules {
                if r.risk_level.is_standard() {
                    prop_assert!(max.rank() >= r.risk_level.rank());
                }
            }

            let standard_max = rules
                .iter()
                .filter(|r| r.risk_level.is_standard())
                .map(|r| r.risk_level.rank())
                .max()
                .unwrap_or(0);
            prop_assert_eq!(max.rank(), standard_max);
        }
    }
}
