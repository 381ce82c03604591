//! MySQL implementation of the TokenRepository trait.
//!
//! Refresh-token records are keyed by id; the signed value handed to clients
//! is never stored. Rotation runs in a transaction whose conditional UPDATE
//! takes the row lock, so concurrent rotations of one record serialize and
//! only the first sees an affected row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use cs_core::domain::entities::RefreshToken;
use cs_core::errors::DomainError;
use cs_core::repositories::TokenRepository;

use super::{parse_uuid, query_failed};

const COLUMNS: &str =
    "id, user_id, family_id, created_at, expires_at, is_revoked, revoked_at, replaced_by";

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<RefreshToken, DomainError> {
        let id: String = row.try_get("id").map_err(query_failed("read id"))?;
        let user_id: String = row.try_get("user_id").map_err(query_failed("read user_id"))?;
        let family_id: String = row
            .try_get("family_id")
            .map_err(query_failed("read family_id"))?;
        let replaced_by: Option<String> = row
            .try_get("replaced_by")
            .map_err(query_failed("read replaced_by"))?;

        Ok(RefreshToken {
            id: parse_uuid("id", &id)?,
            user_id: parse_uuid("user_id", &user_id)?,
            family_id: parse_uuid("family_id", &family_id)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(query_failed("read created_at"))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(query_failed("read expires_at"))?,
            is_revoked: row
                .try_get("is_revoked")
                .map_err(query_failed("read is_revoked"))?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(query_failed("read revoked_at"))?,
            replaced_by: replaced_by
                .as_deref()
                .map(|raw| parse_uuid("replaced_by", raw))
                .transpose()?,
        })
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, user_id, family_id, created_at, expires_at, is_revoked, revoked_at, replaced_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(token.id.to_string())
            .bind(token.user_id.to_string())
            .bind(token.family_id.to_string())
            .bind(token.created_at)
            .bind(token.expires_at)
            .bind(token.is_revoked)
            .bind(token.revoked_at)
            .bind(token.replaced_by.map(|id| id.to_string()))
            .execute(&self.pool)
            .await
            .map_err(query_failed("save refresh token"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!("SELECT {} FROM refresh_tokens WHERE id = ? LIMIT 1", COLUMNS);

        let result = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("find refresh token"))?;

        result.as_ref().map(Self::row_to_token).transpose()
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = ?
            WHERE id = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed("revoke refresh token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate(&self, old_id: Uuid, replacement: &RefreshToken) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(query_failed("begin rotation"))?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = ?, replaced_by = ?
            WHERE id = ? AND is_revoked = FALSE
            "#,
        )
        .bind(Utc::now())
        .bind(replacement.id.to_string())
        .bind(old_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_failed("revoke rotated token"))?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await.map_err(query_failed("roll back rotation"))?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (
                id, user_id, family_id, created_at, expires_at, is_revoked
            ) VALUES (?, ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(replacement.id.to_string())
        .bind(replacement.user_id.to_string())
        .bind(replacement.family_id.to_string())
        .bind(replacement.created_at)
        .bind(replacement.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(query_failed("insert rotated token"))?;

        tx.commit().await.map_err(query_failed("commit rotation"))?;
        Ok(true)
    }

    async fn revoke_family(&self, family_id: Uuid) -> Result<usize, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = ?
            WHERE family_id = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(family_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed("revoke token family"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = ?
            WHERE user_id = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(query_failed("revoke user tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired_before(&self, before: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(query_failed("delete expired tokens"))?;

        Ok(result.rows_affected() as usize)
    }
}
