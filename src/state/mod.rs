use crate::{Decision, DocType, DocumentRecord, ReviewProgress, ReviewStatus, VersionPair};
use chrono::{Local, NaiveDateTime};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during state operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid review decision: {0} (expected Accept, Reject or Request More Information)")]
    InvalidDecision(String),
}

pub type Result<T> = std::result::Result<T, StateError>;

impl FromStr for Decision {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "accept" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            "requestmoreinformation" | "requestmoreinfo" => Ok(Decision::RequestMoreInfo),
            _ => Err(StateError::InvalidDecision(s.to_owned())),
        }
    }
}

/// One saved review in the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub timestamp: NaiveDateTime,
    pub batch: String,
    pub doc_type: DocType,
    pub compared: VersionPair,
    pub status: ReviewStatus,
    pub notes: String,
    pub decision: Decision,
}

/// In-memory review state for one reviewer session.
///
/// Tracks a status per `"{batch}/{docType}"` key and an append-only audit
/// log. A key only ever moves from not-reviewed to reviewed.
#[derive(Debug, Default)]
pub struct ReviewSession {
    statuses: HashMap<String, ReviewStatus>,
    audit_log: Vec<ReviewEntry>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a review stamped with the current local time.
    pub fn record_review(
        &mut self,
        batch: &str,
        doc_type: DocType,
        compared: VersionPair,
        decision: Decision,
        notes: &str,
    ) -> &ReviewEntry {
        let now = Local::now().naive_local();
        self.record_review_at(batch, doc_type, compared, decision, notes, now)
    }

    /// Record a review with an explicit timestamp.
    pub fn record_review_at(
        &mut self,
        batch: &str,
        doc_type: DocType,
        compared: VersionPair,
        decision: Decision,
        notes: &str,
        timestamp: NaiveDateTime,
    ) -> &ReviewEntry {
        self.statuses
            .insert(status_key(batch, doc_type), ReviewStatus::Reviewed);

        self.audit_log.push(ReviewEntry {
            timestamp,
            batch: batch.to_owned(),
            doc_type,
            compared,
            status: ReviewStatus::Reviewed,
            notes: notes.to_owned(),
            decision,
        });

        tracing::info!(
            batch,
            doc_type = %doc_type,
            compared = %compared,
            decision = %decision,
            "review saved"
        );

        &self.audit_log[self.audit_log.len() - 1]
    }

    /// Get the review status for a batch/type.
    ///
    /// Returns `ReviewStatus::NotReviewed` for keys never saved.
    pub fn get_status(&self, batch: &str, doc_type: DocType) -> ReviewStatus {
        self.statuses
            .get(&status_key(batch, doc_type))
            .copied()
            .unwrap_or_default()
    }

    /// Every saved review, oldest first.
    pub fn audit_log(&self) -> &[ReviewEntry] {
        &self.audit_log
    }

    /// Review progress over the batch/type combinations present in `records`.
    pub fn progress(&self, records: &[DocumentRecord]) -> ReviewProgress {
        let keys: BTreeSet<(&str, DocType)> = records
            .iter()
            .map(|r| (r.batch.as_str(), r.doc_type))
            .collect();

        let reviewed = keys
            .iter()
            .filter(|(batch, doc_type)| self.get_status(batch, *doc_type) == ReviewStatus::Reviewed)
            .count();

        ReviewProgress {
            reviewed,
            total: keys.len(),
        }
    }
}

/// Status map key for a batch/type.
pub fn status_key(batch: &str, doc_type: DocType) -> String {
    format!("{}/{}", batch, doc_type)
}
