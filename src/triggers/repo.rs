use sqlx::PgPool;

use super::dto::Trigger;
use crate::users::repo::StoreError;

pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<Trigger>, StoreError> {
    let rows = sqlx::query_as::<_, Trigger>(
        r#"
        SELECT id, name, created_at
          FROM triggers
         WHERE user_id = $1
         ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> Result<Option<Trigger>, StoreError> {
    let row = sqlx::query_as::<_, Trigger>(
        "SELECT id, name, created_at FROM triggers WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_name(db: &PgPool, user_id: i64, name: &str) -> Result<Option<Trigger>, StoreError> {
    let row = sqlx::query_as::<_, Trigger>(
        "SELECT id, name, created_at FROM triggers WHERE user_id = $1 AND name = $2",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(db: &PgPool, user_id: i64, name: &str) -> Result<Trigger, StoreError> {
    sqlx::query_as::<_, Trigger>(
        r#"
        INSERT INTO triggers (user_id, name)
        VALUES ($1, $2)
        RETURNING id, name, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .fetch_one(db)
    .await
    .map_err(StoreError::classify)
}

pub async fn rename(db: &PgPool, user_id: i64, id: i64, name: &str) -> Result<Trigger, StoreError> {
    sqlx::query_as::<_, Trigger>(
        r#"
        UPDATE triggers SET name = $3
         WHERE id = $1 AND user_id = $2
        RETURNING id, name, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .fetch_one(db)
    .await
    .map_err(StoreError::classify)
}

/// Links to episodes are removed by ON DELETE CASCADE.
pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> Result<bool, StoreError> {
    let done = sqlx::query("DELETE FROM triggers WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}
