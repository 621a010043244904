use async_trait::async_trait;
use newsbot_core::{
    domain::{ChatId, UserId},
    store::{User, UserStore},
    Result,
};

use crate::{map_err, now_millis, schema::SqliteStore};

type UserRow = (i64, i64, Option<String>, bool);

fn user_from_row((user_id, chat_id, username, active): UserRow) -> User {
    User {
        user_id: UserId(user_id),
        chat_id: ChatId(chat_id),
        username,
        active,
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT user_id, chat_id, username, active FROM users WHERE user_id = ?",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_err("find user", e))?;
        Ok(row.map(user_from_row))
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO users (user_id, chat_id, username, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.user_id.0)
        .bind(user.chat_id.0)
        .bind(&user.username)
        .bind(user.active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_err("insert user", e))?;
        Ok(())
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<bool> {
        let res = sqlx::query("UPDATE users SET active = ?, updated_at = ? WHERE user_id = ?")
            .bind(active)
            .bind(now_millis())
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| map_err("set active", e))?;
        Ok(res.rows_affected() > 0)
    }

    async fn active_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT user_id, chat_id, username, active FROM users WHERE active = 1 ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_err("list active users", e))?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }
}
