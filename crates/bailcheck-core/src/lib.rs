//! # bailcheck-core
//!
//! Deterministic bail-eligibility evaluation over statute-section rules.
//!
//! This crate answers one question for a case record: given the sections it
//! is charged under and the accused's age, is bail recommended, refused, or
//! recommended on conditions?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same case and rule table always produce the same assessment
//! 2. **Infallible**: Parsing, lookup and evaluation never fail; the decision list always reaches a branch
//! 3. **Traceable**: Every verdict names the branch that fired in its reasoning
//! 4. **Side-effect free**: Persisting the assessment is the caller's job
//!
//! ## Example
//!
//! ```rust,ignore
//! use bailcheck_core::{evaluate, Case, RuleTable};
//!
//! let rules = RuleTable::builtin()?;
//! let assessment = evaluate(&case, &rules);
//!
//! println!("{}: {}", assessment.bail_evaluation.eligibility,
//!     assessment.bail_evaluation.reasoning);
//! ```

pub mod analysis;
pub mod case;
pub mod evaluator;
pub mod rules;
pub mod sections;
pub mod types;

// Re-export main types at crate root
pub use case::{Case, CaseStatus, CaseUpdate, NewCase};
pub use evaluator::{BailEvaluator, BailFacts, BailRule};
pub use rules::{RuleTable, RuleTableError};
pub use sections::parse_sections;
pub use types::{
    Assessment, BailEvaluation, Category, Eligibility, LegalAnalysis, LegalRule, Recommendation,
    RiskLevel,
};

/// Evaluate a case against a rule table.
///
/// This is the main entry point for bail evaluation.
///
/// # Arguments
///
/// * `case` - The case record; only its section text and age are read
/// * `rules` - The rule table to resolve IPC sections against
///
/// # Returns
///
/// An `Assessment` containing:
/// - `legal_analysis`: extracted sections, matched rules, categories, maximum risk
/// - `bail_evaluation`: eligibility, recommendation, conditions, reasoning
pub fn evaluate(case: &Case, rules: &RuleTable) -> Assessment {
    evaluate_sections(
        rules,
        case.ipc_sections.as_deref(),
        case.crpc_sections.as_deref(),
        case.age_years(),
    )
}

/// Evaluate raw section text and age without a case record.
///
/// # Arguments
///
/// * `rules` - The rule table
/// * `ipc_text` - Free-form IPC section list
/// * `crpc_text` - Free-form CrPC section list (recorded, not evaluated)
/// * `age` - Accused's age in whole years
pub fn evaluate_sections(
    rules: &RuleTable,
    ipc_text: Option<&str>,
    crpc_text: Option<&str>,
    age: Option<i64>,
) -> Assessment {
    let legal_analysis = LegalAnalysis::from_text(rules, ipc_text, crpc_text);
    let bail_evaluation = BailEvaluator::new().evaluate(
        age,
        &legal_analysis.categories,
        &legal_analysis.max_risk_level,
    );

    tracing::debug!(
        ipc_sections = ?legal_analysis.ipc_sections,
        matched = legal_analysis.matched_rules.len(),
        eligibility = %bail_evaluation.eligibility,
        "Case evaluated"
    );

    Assessment {
        legal_analysis,
        bail_evaluation,
    }
}
