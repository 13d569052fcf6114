//! Case records.
//!
//! A case is registered from an intake form (`NewCase`), edited with partial
//! updates (`CaseUpdate`), and carries the latest analysis and verdict once
//! bail evaluation has been run. Evaluation results are overwritten on every
//! run; no history is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Assessment, BailEvaluation, LegalAnalysis};

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CaseStatus {
    #[default]
    #[serde(rename = "Registered")]
    Registered,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Bail Recommended")]
    BailRecommended,
    #[serde(rename = "Bail Rejected")]
    BailRejected,
    #[serde(rename = "Closed")]
    Closed,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CaseStatus::Registered => "Registered",
            CaseStatus::UnderReview => "Under Review",
            CaseStatus::BailRecommended => "Bail Recommended",
            CaseStatus::BailRejected => "Bail Rejected",
            CaseStatus::Closed => "Closed",
        };
        f.write_str(label)
    }
}

fn default_offense_type() -> String {
    "Unknown".to_string()
}

/// Intake fields submitted when registering a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub fir_number: String,

    #[serde(default)]
    pub case_title: String,

    #[serde(default)]
    pub police_station: String,

    #[serde(default)]
    pub accused_name: String,

    /// Free text as entered; numbers are accepted and kept as text
    #[serde(default, with = "age_text", skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Raw IPC section list, e.g. "302, 307, 120B"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc_sections: Option<String>,

    /// Raw CrPC section list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crpc_sections: Option<String>,

    #[serde(default = "default_offense_type")]
    pub offense_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrest_date: Option<String>,
}

impl NewCase {
    pub fn new(fir_number: impl Into<String>) -> Self {
        Self {
            fir_number: fir_number.into(),
            case_title: String::new(),
            police_station: String::new(),
            accused_name: String::new(),
            age: None,
            gender: None,
            ipc_sections: None,
            crpc_sections: None,
            offense_type: default_offense_type(),
            case_description: None,
            arrest_date: None,
        }
    }

    pub fn with_ipc_sections(mut self, sections: impl Into<String>) -> Self {
        self.ipc_sections = Some(sections.into());
        self
    }

    pub fn with_crpc_sections(mut self, sections: impl Into<String>) -> Self {
        self.crpc_sections = Some(sections.into());
        self
    }

    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = Some(age.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.case_title = title.into();
        self
    }
}

/// A registered case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,

    pub fir_number: String,

    #[serde(default)]
    pub case_title: String,

    #[serde(default)]
    pub police_station: String,

    #[serde(default)]
    pub accused_name: String,

    #[serde(default, with = "age_text", skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc_sections: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crpc_sections: Option<String>,

    #[serde(default = "default_offense_type")]
    pub offense_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrest_date: Option<String>,

    #[serde(default)]
    pub status: CaseStatus,

    pub created_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Set together with `bail_evaluation` by [`Case::record_assessment`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_analysis: Option<LegalAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bail_evaluation: Option<BailEvaluation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl Case {
    /// Register a case from intake fields. Status starts at `Registered`.
    pub fn register(
        id: impl Into<String>,
        created_by: impl Into<String>,
        intake: NewCase,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            fir_number: intake.fir_number,
            case_title: intake.case_title,
            police_station: intake.police_station,
            accused_name: intake.accused_name,
            age: intake.age,
            gender: intake.gender,
            ipc_sections: intake.ipc_sections,
            crpc_sections: intake.crpc_sections,
            offense_type: intake.offense_type,
            case_description: intake.case_description,
            arrest_date: intake.arrest_date,
            status: CaseStatus::Registered,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            legal_analysis: None,
            bail_evaluation: None,
            analyzed_at: None,
        }
    }

    /// Age in whole years, parsed from the stored text.
    ///
    /// Reads an optional sign and the leading digits after any whitespace,
    /// ignoring whatever follows ("65 years" → 65). Text with no leading
    /// integer is treated as absent.
    pub fn age_years(&self) -> Option<i64> {
        self.age.as_deref().and_then(parse_leading_int)
    }

    /// Store an assessment, replacing any previous one.
    pub fn record_assessment(&mut self, assessment: Assessment, now: DateTime<Utc>) {
        self.legal_analysis = Some(assessment.legal_analysis);
        self.bail_evaluation = Some(assessment.bail_evaluation);
        self.analyzed_at = Some(now);
    }

    /// The stored assessment, if evaluation has run.
    pub fn assessment(&self) -> Option<Assessment> {
        match (&self.legal_analysis, &self.bail_evaluation) {
            (Some(analysis), Some(evaluation)) => Some(Assessment {
                legal_analysis: analysis.clone(),
                bail_evaluation: evaluation.clone(),
            }),
            _ => None,
        }
    }

    /// Both halves of the assessment are present.
    pub fn is_evaluated(&self) -> bool {
        self.legal_analysis.is_some() && self.bail_evaluation.is_some()
    }
}

/// Partial update of a case's editable fields.
///
/// Absent fields are left untouched. Derived evaluation fields cannot be
/// set through an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fir_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub police_station: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accused_name: Option<String>,
    #[serde(default, with = "age_text", skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc_sections: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crpc_sections: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offense_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrest_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
}

impl CaseUpdate {
    /// Apply the update and bump `updated_at`.
    pub fn apply(self, case: &mut Case, now: DateTime<Utc>) {
        fn set<T>(field: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *field = value;
            }
        }
        fn set_opt<T>(field: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *field = value;
            }
        }

        set(&mut case.fir_number, self.fir_number);
        set(&mut case.case_title, self.case_title);
        set(&mut case.police_station, self.police_station);
        set(&mut case.accused_name, self.accused_name);
        set_opt(&mut case.age, self.age);
        set_opt(&mut case.gender, self.gender);
        set_opt(&mut case.ipc_sections, self.ipc_sections);
        set_opt(&mut case.crpc_sections, self.crpc_sections);
        set(&mut case.offense_type, self.offense_type);
        set_opt(&mut case.case_description, self.case_description);
        set_opt(&mut case.arrest_date, self.arrest_date);
        set(&mut case.status, self.status);
        case.updated_at = now;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Leading-integer parse: whitespace, optional sign, then ASCII digits.
///
/// A digit run too long for `i64` saturates toward its sign instead of
/// failing, so "99999999999999999999" still reads as a very large age.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().try_fold(0i64, |acc, b| {
        acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
    });
    Some(match (magnitude, negative) {
        (Some(n), true) => -n,
        (Some(n), false) => n,
        (None, true) => i64::MIN,
        (None, false) => i64::MAX,
    })
}

/// Serde helpers for age fields: accept a string or a JSON number.
mod age_text {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn serialize<S>(age: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match age {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(raw.map(|raw| match raw {
            Raw::Text(text) => text,
            Raw::Int(n) => n.to_string(),
            Raw::Float(n) => n.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("65"), Some(65));
        assert_eq!(parse_leading_int("  42 years"), Some(42));
        assert_eq!(parse_leading_int("+70"), Some(70));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("sixty"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_parse_leading_int_saturates_on_overflow() {
        assert_eq!(parse_leading_int("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("-99999999999999999999 years"), Some(i64::MIN));
        assert_eq!(parse_leading_int("9223372036854775807"), Some(i64::MAX));

        let case = Case::register(
            "CASE-000001",
            "officer-1",
            NewCase::new("FIR/1").with_age("99999999999999999999"),
            now(),
        );
        let age = case.age_years().unwrap();
        assert!(age > crate::evaluator::SENIOR_CITIZEN_AGE);
    }

    #[test]
    fn test_register_starts_registered() {
        let intake = NewCase::new("FIR/2024/004").with_ipc_sections("498A, 323");
        let case = Case::register("CASE-000001", "officer-1", intake, now());
        assert_eq!(case.status, CaseStatus::Registered);
        assert_eq!(case.created_at, case.updated_at);
        assert!(!case.is_evaluated());
        assert!(case.legal_analysis.is_none());
    }

    #[test]
    fn test_age_accepts_number_or_text() {
        let from_number: NewCase =
            serde_json::from_value(serde_json::json!({ "firNumber": "F1", "age": 65 })).unwrap();
        assert_eq!(from_number.age.as_deref(), Some("65"));

        let from_text: NewCase =
            serde_json::from_value(serde_json::json!({ "firNumber": "F1", "age": "42" })).unwrap();
        assert_eq!(from_text.age.as_deref(), Some("42"));

        let missing: NewCase =
            serde_json::from_value(serde_json::json!({ "firNumber": "F1" })).unwrap();
        assert!(missing.age.is_none());
        assert_eq!(missing.offense_type, "Unknown");
    }

    #[test]
    fn test_malformed_age_is_absent() {
        let mut case = Case::register("C1", "u1", NewCase::new("F1"), now());
        case.age = Some("unknown".to_string());
        assert_eq!(case.age_years(), None);
        case.age = Some("67".to_string());
        assert_eq!(case.age_years(), Some(67));
    }

    #[test]
    fn test_update_is_partial_and_bumps_timestamp() {
        let mut case = Case::register(
            "C1",
            "u1",
            NewCase::new("F1").with_title("Theft").with_ipc_sections("379"),
            now(),
        );
        let later = now() + chrono::Duration::hours(2);
        let update = CaseUpdate {
            status: Some(CaseStatus::UnderReview),
            ..Default::default()
        };
        update.apply(&mut case, later);

        assert_eq!(case.status, CaseStatus::UnderReview);
        assert_eq!(case.case_title, "Theft");
        assert_eq!(case.ipc_sections.as_deref(), Some("379"));
        assert_eq!(case.updated_at, later);
    }

    #[test]
    fn test_status_wire_labels() {
        let value = serde_json::to_value(CaseStatus::UnderReview).unwrap();
        assert_eq!(value, "Under Review");
        let status: CaseStatus = serde_json::from_value(serde_json::json!("Bail Rejected")).unwrap();
        assert_eq!(status, CaseStatus::BailRejected);
    }

    #[test]
    fn test_stored_case_with_half_an_assessment_is_unevaluated() {
        let rules = crate::RuleTable::builtin().unwrap();
        let mut case = Case::register(
            "C1",
            "u1",
            NewCase::new("F1").with_ipc_sections("379"),
            now(),
        );
        let assessment = crate::evaluate_sections(&rules, Some("379"), None, None);
        case.record_assessment(assessment, now());
        let stored = serde_json::to_value(&case).unwrap();

        for missing in ["legalAnalysis", "bailEvaluation"] {
            let mut value = stored.clone();
            value.as_object_mut().unwrap().remove(missing);
            let loaded: Case = serde_json::from_value(value).unwrap();
            assert!(loaded.assessment().is_none(), "{} removed", missing);
            assert!(!loaded.is_evaluated(), "{} removed", missing);
        }

        let loaded: Case = serde_json::from_value(stored).unwrap();
        assert!(loaded.is_evaluated());
        assert!(loaded.assessment().is_some());
    }

    #[test]
    fn test_unevaluated_case_omits_derived_fields() {
        let case = Case::register("C1", "u1", NewCase::new("F1"), now());
        let value = serde_json::to_value(&case).unwrap();
        assert!(value.get("legalAnalysis").is_none());
        assert!(value.get("bailEvaluation").is_none());
        assert_eq!(value["firNumber"], "F1");
        assert_eq!(value["status"], "Registered");
    }
}
