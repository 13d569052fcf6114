//! Case and audit storage.
//!
//! [`CaseStore`] is the persistence seam for the case service. The bundled
//! [`InMemoryCaseStore`] keeps everything in process memory; writes are last
//! write wins with no optimistic locking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bailcheck_core::{Case, CaseStatus};

/// Errors from a case store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Case not found: {0}")]
    NotFound(String),

    #[error("Case already exists: {0}")]
    Conflict(String),
}

/// Audited actions on cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "Case Created")]
    CaseCreated,
    #[serde(rename = "Case Updated")]
    CaseUpdated,
    #[serde(rename = "Bail Evaluation Run")]
    BailEvaluationRun,
    #[serde(rename = "Report Generated")]
    ReportGenerated,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AuditAction::CaseCreated => "Case Created",
            AuditAction::CaseUpdated => "Case Updated",
            AuditAction::BailEvaluationRun => "Bail Evaluation Run",
            AuditAction::ReportGenerated => "Report Generated",
        })
    }
}

/// Case identifiers attached to an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDetails {
    pub case_id: String,
    pub fir_number: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<CaseStatus>,
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Acting officer
    pub user_id: String,
    pub action: AuditAction,
    pub details: AuditDetails,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        user_id: impl Into<String>,
        action: AuditAction,
        case: &Case,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            action,
            details: AuditDetails {
                case_id: case.id.clone(),
                fir_number: case.fir_number.clone(),
                status: None,
            },
            timestamp,
        }
    }

    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.details.status = Some(status);
        self
    }
}

/// Persistence for cases and the audit trail.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Allocate a fresh case identifier.
    async fn next_id(&self) -> String;

    /// Insert a new case. Fails if the id is taken.
    async fn insert(&self, case: Case) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Case, StoreError>;

    /// All cases, newest first.
    async fn list(&self) -> Vec<Case>;

    /// Replace a stored case wholesale. Fails if the id is unknown.
    async fn replace(&self, case: Case) -> Result<(), StoreError>;

    async fn append_audit(&self, entry: AuditEntry);

    /// Most recent audit entries first, at most `limit`.
    async fn list_audit(&self, limit: usize) -> Vec<AuditEntry>;
}

/// Process-local case store.
///
/// Audit retention is unbounded: every appended entry is kept for the life
/// of the process, and `list_audit` only caps how many are read back.
/// Deployments that need rotation should supply their own [`CaseStore`].
#[derive(Debug, Default)]
pub struct InMemoryCaseStore {
    cases: RwLock<HashMap<String, Case>>,
    audit: RwLock<Vec<AuditEntry>>,
    sequence: AtomicU64,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn next_id(&self) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("CASE-{:06}", n)
    }

    async fn insert(&self, case: Case) -> Result<(), StoreError> {
        let mut cases = self.cases.write();
        if cases.contains_key(&case.id) {
            return Err(StoreError::Conflict(case.id));
        }
        cases.insert(case.id.clone(), case);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Case, StoreError> {
        self.cases
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Vec<Case> {
        let mut cases: Vec<Case> = self.cases.read().values().cloned().collect();
        // Ids are zero-padded and sequential, so they break timestamp ties
        cases.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        cases
    }

    async fn replace(&self, case: Case) -> Result<(), StoreError> {
        let mut cases = self.cases.write();
        match cases.get_mut(&case.id) {
            Some(slot) => {
                *slot = case;
                Ok(())
            }
            None => Err(StoreError::NotFound(case.id)),
        }
    }

    async fn append_audit(&self, entry: AuditEntry) {
        self.audit.write().push(entry);
    }

    async fn list_audit(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.read().iter().rev().take(limit).cloned().collect()
    }
}
