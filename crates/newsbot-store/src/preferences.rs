use async_trait::async_trait;
use newsbot_core::{
    domain::UserId,
    store::{PreferenceKind, PreferenceRecord, PreferenceStore},
    Error, Result,
};

use crate::{map_err, now_millis, schema::SqliteStore};

fn table(kind: PreferenceKind) -> &'static str {
    match kind {
        PreferenceKind::Category => "category_preferences",
        PreferenceKind::Source => "source_preferences",
    }
}

/// Items are stored as a JSON array to keep insertion order.
fn encode_items(items: &[String]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

fn decode_items(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| Error::Store(format!("corrupt preference items: {e}")))
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn find_preference(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
    ) -> Result<Option<PreferenceRecord>> {
        let sql = format!(
            "SELECT items, page_size FROM {} WHERE user_id = ?",
            table(kind)
        );
        let row: Option<(String, i64)> = sqlx::query_as(&sql)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_err("find preference", e))?;

        let Some((items, page_size)) = row else {
            return Ok(None);
        };
        Ok(Some(PreferenceRecord {
            kind,
            user_id,
            items: decode_items(&items)?,
            page_size: u32::try_from(page_size)
                .map_err(|_| Error::Store(format!("invalid stored page size {page_size}")))?,
        }))
    }

    async fn insert_preference(&self, record: &PreferenceRecord) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (user_id, items, page_size, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            table(record.kind)
        );
        let now = now_millis();
        sqlx::query(&sql)
            .bind(record.user_id.0)
            .bind(encode_items(&record.items)?)
            .bind(i64::from(record.page_size))
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("insert preference", e))?;
        Ok(())
    }

    async fn update_items(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        items: &[String],
    ) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET items = ?, updated_at = ? WHERE user_id = ?",
            table(kind)
        );
        let res = sqlx::query(&sql)
            .bind(encode_items(items)?)
            .bind(now_millis())
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("update preference items", e))?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_page_size(
        &self,
        kind: PreferenceKind,
        user_id: UserId,
        page_size: u32,
    ) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET page_size = ?, updated_at = ? WHERE user_id = ?",
            table(kind)
        );
        let res = sqlx::query(&sql)
            .bind(i64::from(page_size))
            .bind(now_millis())
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("update page size", e))?;
        Ok(res.rows_affected() > 0)
    }
}
