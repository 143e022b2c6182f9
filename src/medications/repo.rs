use sqlx::PgPool;

use super::dto::Medication;
use crate::users::repo::StoreError;

pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<Medication>, StoreError> {
    let rows = sqlx::query_as::<_, Medication>(
        r#"
        SELECT id, name, dosage, created_at
          FROM medications
         WHERE user_id = $1
         ORDER BY name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> Result<Option<Medication>, StoreError> {
    let row = sqlx::query_as::<_, Medication>(
        "SELECT id, name, dosage, created_at FROM medications WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_name(db: &PgPool, user_id: i64, name: &str) -> Result<Option<Medication>, StoreError> {
    let row = sqlx::query_as::<_, Medication>(
        "SELECT id, name, dosage, created_at FROM medications WHERE user_id = $1 AND name = $2",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    user_id: i64,
    name: &str,
    dosage: Option<&str>,
) -> Result<Medication, StoreError> {
    sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (user_id, name, dosage)
        VALUES ($1, $2, $3)
        RETURNING id, name, dosage, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(dosage)
    .fetch_one(db)
    .await
    .map_err(StoreError::classify)
}

/// `name = None` keeps the current name; `dosage` always overwrites.
pub async fn update(
    db: &PgPool,
    user_id: i64,
    id: i64,
    name: Option<&str>,
    dosage: Option<&str>,
) -> Result<Medication, StoreError> {
    sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications
           SET name = COALESCE($3, name),
               dosage = $4
         WHERE id = $1 AND user_id = $2
        RETURNING id, name, dosage, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(dosage)
    .fetch_one(db)
    .await
    .map_err(StoreError::classify)
}

pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> Result<bool, StoreError> {
    let done = sqlx::query("DELETE FROM medications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}
