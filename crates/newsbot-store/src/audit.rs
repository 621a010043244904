use async_trait::async_trait;
use newsbot_core::{
    store::{AuditRecord, AuditStore},
    Result,
};

use crate::{map_err, now_millis, schema::SqliteStore};

#[async_trait]
impl AuditStore for SqliteStore {
    async fn append_audit(&self, record: &AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (initiator, action, target, result, timestamp, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.initiator)
        .bind(&record.action)
        .bind(&record.target)
        .bind(&record.result)
        .bind(record.timestamp.to_rfc3339())
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| map_err("append audit", e))?;
        Ok(())
    }
}
