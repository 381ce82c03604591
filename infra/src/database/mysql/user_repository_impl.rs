//! MySQL implementation of the UserRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use cs_core::domain::entities::User;
use cs_core::errors::{AuthError, DomainError};
use cs_core::repositories::UserRepository;

use super::{parse_uuid, query_failed};

const COLUMNS: &str = "id, username, email, password_hash, role, status, \
                       created_at, updated_at, password_changed_at";

/// MySQL implementation of UserRepository
///
/// Emails are stored lowercased; uniqueness of username and email is enforced
/// by the table's unique keys.
pub struct MySqlUserRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to User entity
    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<User, DomainError> {
        let id: String = row.try_get("id").map_err(query_failed("read id"))?;
        let role: String = row.try_get("role").map_err(query_failed("read role"))?;
        let status: String = row.try_get("status").map_err(query_failed("read status"))?;

        Ok(User {
            id: parse_uuid("id", &id)?,
            username: row.try_get("username").map_err(query_failed("read username"))?,
            email: row.try_get("email").map_err(query_failed("read email"))?,
            password_hash: row
                .try_get("password_hash")
                .map_err(query_failed("read password_hash"))?,
            role: role.parse().map_err(DomainError::internal)?,
            status: status.parse().map_err(DomainError::internal)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(query_failed("read created_at"))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(query_failed("read updated_at"))?,
            password_changed_at: row
                .try_get::<DateTime<Utc>, _>("password_changed_at")
                .map_err(query_failed("read password_changed_at"))?,
        })
    }

    async fn find_one(&self, column: &str, value: String) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE {} = ? LIMIT 1", COLUMNS, column);

        let result = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("find user"))?;

        result.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.find_one("id", id.to_string()).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.find_one("username", username.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.find_one("email", email.to_lowercase()).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            INSERT INTO users (
                id, username, email, password_hash, role, status,
                created_at, updated_at, password_changed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(user.email.to_lowercase())
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.status.as_str())
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(user.password_changed_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AuthError::UserAlreadyExists.into())
            }
            Err(e) => Err(query_failed("create user")(e)),
        }
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
        expected_changed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE users
            SET password_hash = ?, password_changed_at = ?, updated_at = ?
            WHERE id = ? AND password_changed_at = ?
        "#;

        let result = sqlx::query(query)
            .bind(password_hash)
            .bind(changed_at)
            .bind(changed_at)
            .bind(id.to_string())
            .bind(expected_changed_at)
            .execute(&self.pool)
            .await
            .map_err(query_failed("update password"))?;

        Ok(result.rows_affected() > 0)
    }
}
