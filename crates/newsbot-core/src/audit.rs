use std::sync::Arc;

use chrono::Utc;

use crate::store::{AuditRecord, AuditStore};

/// Outcome stored in the `result` column of an audit record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failed,
}

impl AuditOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failed => "failed",
        }
    }

    pub fn from_ok(ok: bool) -> Self {
        if ok {
            AuditOutcome::Success
        } else {
            AuditOutcome::Failed
        }
    }
}

/// Explicit audit checkpoint writer.
///
/// Audit writes are best-effort: a failing write is logged and never fails the audited
/// operation.
#[derive(Clone)]
pub struct Auditor {
    store: Arc<dyn AuditStore>,
}

impl Auditor {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        initiator: &str,
        action: &str,
        target: impl ToString,
        outcome: AuditOutcome,
    ) {
        let record = AuditRecord {
            initiator: initiator.to_string(),
            action: action.to_string(),
            target: target.to_string(),
            result: outcome.as_str().to_string(),
            timestamp: Utc::now(),
        };

        match self.store.append_audit(&record).await {
            Ok(()) => tracing::debug!(
                initiator = %record.initiator,
                action = %record.action,
                target = %record.target,
                result = %record.result,
                "audit recorded"
            ),
            Err(e) => tracing::warn!(
                initiator = %record.initiator,
                action = %record.action,
                target = %record.target,
                "failed to write audit record: {e}"
            ),
        }
    }
}
