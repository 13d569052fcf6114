//! Rule table loading and lookup.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_rule_table_schema;
use crate::sections::compare_sections;
use crate::types::LegalRule;

/// Embedded IPC catalogue used when no rule file is configured.
const DEFAULT_RULES_YAML: &str = include_str!("../../data/legal_rules.yaml");

/// Errors that can occur when loading a rule table.
#[derive(Error, Debug)]
pub enum RuleTableError {
    #[error("Failed to read rule table: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Rule table failed schema validation: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Duplicate section in rule table: {0}")]
    DuplicateSection(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Immutable collection of legal rules, keyed by section identifier.
///
/// Rules are kept sorted by section number so that lookups return matches in
/// a stable order regardless of how the source file was laid out.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<LegalRule>,
}

impl RuleTable {
    /// Build a table from already-parsed rules.
    pub fn new(mut rules: Vec<LegalRule>) -> Result<Self, RuleTableError> {
        rules.sort_by(|a, b| compare_sections(&a.section, &b.section));
        let table = Self { rules };
        table.validate()?;
        Ok(table)
    }

    /// The embedded IPC catalogue.
    pub fn builtin() -> Result<Self, RuleTableError> {
        Self::from_yaml(DEFAULT_RULES_YAML)
    }

    /// Parse a rule table from a YAML list.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleTableError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a rule table from a JSON array.
    pub fn from_json(json: &str) -> Result<Self, RuleTableError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load a rule table file, picking the format from its extension.
    ///
    /// `.json` files are read as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleTableError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, RuleTableError> {
        validate_rule_table_schema(&value).map_err(RuleTableError::SchemaViolation)?;
        let rules: Vec<LegalRule> = serde_json::from_value(value)?;
        Self::new(rules)
    }

    fn validate(&self) -> Result<(), RuleTableError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.section.is_empty() {
                return Err(RuleTableError::MissingField("section".to_string()));
            }
            if rule.offense.is_empty() {
                return Err(RuleTableError::MissingField(format!(
                    "offense (section {})",
                    rule.section
                )));
            }
            if !seen.insert(rule.section.as_str()) {
                return Err(RuleTableError::DuplicateSection(rule.section.clone()));
            }
        }
        Ok(())
    }

    /// Rules whose section exactly equals one of `sections`.
    ///
    /// Set membership, not pattern matching: "120" does not match "120B".
    /// Matches come back in ascending section order, independent of the
    /// order of `sections`.
    pub fn lookup(&self, sections: &[String]) -> Vec<LegalRule> {
        let wanted: HashSet<&str> = sections.iter().map(String::as_str).collect();
        self.rules
            .iter()
            .filter(|rule| wanted.contains(rule.section.as_str()))
            .cloned()
            .collect()
    }

    /// Get a single rule by section.
    pub fn get(&self, section: &str) -> Option<&LegalRule> {
        self.rules.iter().find(|rule| rule.section == section)
    }

    /// Case-insensitive substring search over section, offense and description.
    ///
    /// An empty (or whitespace-only) term returns every rule.
    pub fn search(&self, term: &str) -> Vec<&LegalRule> {
        let needle = term.trim().to_lowercase();
        self.rules
            .iter()
            .filter(|rule| {
                needle.is_empty()
                    || rule.section.to_lowercase().contains(&needle)
                    || rule.offense.to_lowercase().contains(&needle)
                    || rule.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LegalRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, RiskLevel};

    const SMALL_TABLE: &str = r#"
- section: "420"
  type: "IPC"
  offense: "Cheating"
  category: "Bailable"
  riskLevel: "Medium"
  description: "Cheating and dishonestly inducing delivery of property"
- section: "302"
  type: "IPC"
  offense: "Murder"
  category: "Non-Bailable"
  riskLevel: "High"
  description: "Punishment for murder"
- section: "120B"
  type: "IPC"
  offense: "Criminal conspiracy"
  category: "Depends"
  riskLevel: "Medium"
  description: "Punishment for criminal conspiracy"
"#;

    fn sections(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_catalogue_loads() {
        let table = RuleTable::builtin().unwrap();
        assert_eq!(table.len(), 57);

        let murder = table.get("302").unwrap();
        assert_eq!(murder.category, Category::NonBailable);
        assert_eq!(murder.risk_level, RiskLevel::High);

        let common_intention = table.get("34").unwrap();
        assert_eq!(
            common_intention.risk_level,
            RiskLevel::Unrated("Variable".to_string())
        );
    }

    #[test]
    fn test_lookup_is_sorted_by_section() {
        let table = RuleTable::from_yaml(SMALL_TABLE).unwrap();
        let matched = table.lookup(&sections(&["420", "302"]));
        let order: Vec<&str> = matched.iter().map(|r| r.section.as_str()).collect();
        assert_eq!(order, vec!["302", "420"]);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let table = RuleTable::from_yaml(SMALL_TABLE).unwrap();
        assert!(table.lookup(&sections(&["120"])).is_empty());
        assert!(table.lookup(&sections(&["30"])).is_empty());
        assert_eq!(table.lookup(&sections(&["120B"])).len(), 1);
    }

    #[test]
    fn test_lookup_unknown_sections_is_empty() {
        let table = RuleTable::from_yaml(SMALL_TABLE).unwrap();
        assert!(table.lookup(&sections(&["999"])).is_empty());
        assert!(table.lookup(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let yaml = r#"
- section: "379"
  type: "IPC"
  offense: "Theft"
  category: "Bailable"
  riskLevel: "Low"
  description: "Punishment for theft"
- section: "379"
  type: "IPC"
  offense: "Theft again"
  category: "Bailable"
  riskLevel: "Low"
  description: "Duplicate"
"#;
        assert!(matches!(
            RuleTable::from_yaml(yaml),
            Err(RuleTableError::DuplicateSection(section)) if section == "379"
        ));
    }

    #[test]
    fn test_schema_violation_reported() {
        let json = r#"[{ "section": "302", "type": "IPC" }]"#;
        assert!(matches!(
            RuleTable::from_json(json),
            Err(RuleTableError::SchemaViolation(_))
        ));
    }

    #[test]
    fn test_search_matches_section_offense_and_description() {
        let table = RuleTable::builtin().unwrap();

        let by_section = table.search("498");
        assert!(by_section.iter().any(|r| r.section == "498A"));

        let by_offense = table.search("THEFT");
        assert!(by_offense.iter().any(|r| r.section == "379"));
        assert!(by_offense.iter().any(|r| r.section == "380"));

        let by_description = table.search("dwelling");
        assert!(by_description.iter().all(|r| r
            .description
            .to_lowercase()
            .contains("dwelling")
            || r.offense.to_lowercase().contains("dwelling")));

        assert_eq!(table.search("  ").len(), table.len());
        assert!(table.search("no such offense anywhere").is_empty());
    }
}
