//! Case service: registration, editing, bail evaluation and reporting.
//!
//! Every mutating operation takes the acting officer's id and leaves an
//! audit entry. Evaluation itself is delegated to `bailcheck-core`; this
//! layer only loads, persists and records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bailcheck_core::{
    Assessment, Case, CaseStatus, CaseUpdate, LegalRule, NewCase, Recommendation, RuleTable,
    RuleTableError,
};

use crate::config::RuntimeConfig;
use crate::store::{AuditAction, AuditEntry, CaseStore, StoreError};

/// Errors from the case service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to load rule table: {0}")]
    Rules(#[from] RuleTableError),
}

/// Headline counts for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_cases: usize,
    /// Cases with status "Under Review"
    pub under_review: usize,
    /// Cases whose latest evaluation recommends bail outright
    pub bail_recommended: usize,
    /// Cases whose latest evaluation does not recommend bail
    pub bail_rejected: usize,
}

/// Printable case report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub case: Case,
    pub officer: String,
    pub generated_at: DateTime<Utc>,
}

/// Case operations over a store and a rule table.
pub struct CaseService {
    store: Arc<dyn CaseStore>,
    rules: Arc<RuleTable>,
    audit_log_limit: usize,
}

impl CaseService {
    pub fn new(store: Arc<dyn CaseStore>, rules: Arc<RuleTable>) -> Self {
        Self {
            store,
            rules,
            audit_log_limit: 100,
        }
    }

    /// Build a service from configuration, loading the configured rule table.
    pub fn from_config(
        config: &RuntimeConfig,
        store: Arc<dyn CaseStore>,
    ) -> Result<Self, ServiceError> {
        let rules = config.load_rules()?;
        Ok(Self::new(store, Arc::new(rules)).with_audit_log_limit(config.audit_log_limit))
    }

    pub fn with_audit_log_limit(mut self, limit: usize) -> Self {
        self.audit_log_limit = limit;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Register a new case. Returns the assigned id.
    pub async fn register_case(&self, actor: &str, intake: NewCase) -> Result<String, ServiceError> {
        let id = self.store.next_id().await;
        let now = Utc::now();
        let case = Case::register(id.clone(), actor, intake, now);

        let entry = AuditEntry::new(actor, AuditAction::CaseCreated, &case, now);
        self.store.insert(case).await?;
        self.store.append_audit(entry).await;

        tracing::info!(case_id = %id, actor, "Case registered");
        Ok(id)
    }

    pub async fn get_case(&self, id: &str) -> Result<Case, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    /// All cases, newest first.
    pub async fn list_cases(&self) -> Vec<Case> {
        self.store.list().await
    }

    /// Apply a partial update. Stored analysis and verdict are left as they
    /// were, even when the sections or age change.
    pub async fn update_case(
        &self,
        actor: &str,
        id: &str,
        update: CaseUpdate,
    ) -> Result<Case, ServiceError> {
        let mut case = self.store.get(id).await?;
        let now = Utc::now();
        let new_status = update.status;
        update.apply(&mut case, now);

        let mut entry = AuditEntry::new(actor, AuditAction::CaseUpdated, &case, now);
        if let Some(status) = new_status {
            entry = entry.with_status(status);
        }
        self.store.replace(case.clone()).await?;
        self.store.append_audit(entry).await;

        tracing::info!(case_id = %id, actor, "Case updated");
        Ok(case)
    }

    /// Run bail evaluation on a stored case and persist the result.
    pub async fn analyze_case(&self, actor: &str, id: &str) -> Result<Assessment, ServiceError> {
        let mut case = self.store.get(id).await?;
        let assessment = bailcheck_core::evaluate(&case, &self.rules);
        let now = Utc::now();
        case.record_assessment(assessment.clone(), now);

        let entry = AuditEntry::new(actor, AuditAction::BailEvaluationRun, &case, now);
        self.store.replace(case).await?;
        self.store.append_audit(entry).await;

        tracing::info!(
            case_id = %id,
            actor,
            eligibility = %assessment.bail_evaluation.eligibility,
            matched = assessment.legal_analysis.matched_rules.len(),
            "Bail evaluation run"
        );
        Ok(assessment)
    }

    /// Report for printing. Does not require the case to have been evaluated.
    pub async fn case_report(&self, actor: &str, id: &str) -> Result<CaseReport, ServiceError> {
        let case = self.store.get(id).await?;
        let now = Utc::now();
        self.store
            .append_audit(AuditEntry::new(actor, AuditAction::ReportGenerated, &case, now))
            .await;

        tracing::info!(case_id = %id, actor, "Report generated");
        Ok(CaseReport {
            case,
            officer: actor.to_string(),
            generated_at: now,
        })
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let cases = self.store.list().await;
        let recommendation_count = |wanted: Recommendation| {
            cases
                .iter()
                .filter(|c| {
                    c.bail_evaluation
                        .as_ref()
                        .is_some_and(|e| e.recommendation == wanted)
                })
                .count()
        };

        DashboardStats {
            total_cases: cases.len(),
            under_review: cases
                .iter()
                .filter(|c| c.status == CaseStatus::UnderReview)
                .count(),
            bail_recommended: recommendation_count(Recommendation::BailRecommended),
            bail_rejected: recommendation_count(Recommendation::BailNotRecommended),
        }
    }

    /// Most recent audit entries, capped at the configured limit.
    pub async fn audit_logs(&self) -> Vec<AuditEntry> {
        self.store.list_audit(self.audit_log_limit).await
    }

    /// Reference list of rules, filtered by a case-insensitive search term.
    pub fn legal_rules(&self, search: Option<&str>) -> Vec<LegalRule> {
        self.rules
            .search(search.unwrap_or(""))
            .into_iter()
            .cloned()
            .collect()
    }
}
