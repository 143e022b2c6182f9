use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::db::is_unique_violation;
use crate::users::repo_types::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn classify(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            StoreError::Duplicate
        } else {
            StoreError::Database(err)
        }
    }
}

/// Persisted user records. Every authenticated request resolves its subject through here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError>;
    async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, StoreError>;
    /// Removes the user together with its episodes, triggers and medications.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Run in order inside one transaction. Link rows go with their episode via ON DELETE CASCADE,
/// and the user row must come last because its foreign keys do not cascade.
pub(crate) const ACCOUNT_DELETION: [&str; 4] = [
    "DELETE FROM episodes WHERE user_id = $1",
    "DELETE FROM triggers WHERE user_id = $1",
    "DELETE FROM medications WHERE user_id = $1",
    "DELETE FROM users WHERE id = $1",
];

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::classify)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email)
             WHERE id = $1
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::classify)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        let mut removed = 0;
        for sql in ACCOUNT_DELETION {
            removed += sqlx::query(sql)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        debug!(user_id = id, removed, "user and dependents deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(sql: &str) -> &str {
        sql.trim_start_matches("DELETE FROM ")
            .split_whitespace()
            .next()
            .unwrap_or_default()
    }

    #[test]
    fn account_deletion_removes_dependents_before_the_user() {
        let tables: Vec<&str> = ACCOUNT_DELETION.iter().map(|sql| table_of(sql)).collect();
        assert_eq!(tables, ["episodes", "triggers", "medications", "users"]);
        assert!(ACCOUNT_DELETION.last().unwrap().ends_with("WHERE id = $1"));
    }

    #[test]
    fn account_deletion_scopes_every_dependent_to_the_user() {
        let (user, dependents) = ACCOUNT_DELETION.split_last().unwrap();
        assert_eq!(table_of(user), "users");
        for sql in dependents {
            assert!(sql.ends_with("WHERE user_id = $1"), "{sql}");
        }
    }

    #[test]
    fn episodes_go_before_the_catalogs_they_link_to() {
        let position = |table: &str| {
            ACCOUNT_DELETION
                .iter()
                .position(|sql| table_of(sql) == table)
                .unwrap()
        };
        assert!(position("episodes") < position("triggers"));
        assert!(position("episodes") < position("medications"));
    }
}
