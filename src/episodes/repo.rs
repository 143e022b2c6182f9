use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use super::dto::{EpisodeRequest, EpisodeRow};
use crate::{medications::dto::Medication, triggers::dto::Trigger, users::repo::StoreError};

const EPISODE_COLUMNS: &str =
    "id, user_id, date, intensity, duration_minutes, notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct TriggerLink {
    pub episode_id: i64,
    #[sqlx(flatten)]
    pub trigger: Trigger,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MedicationLink {
    pub episode_id: i64,
    #[sqlx(flatten)]
    pub medication: Medication,
}

/// Newest first. Either bound of the date range may be absent.
pub async fn list_by_user(
    db: &PgPool,
    user_id: i64,
    skip: i64,
    limit: i64,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<Vec<EpisodeRow>, StoreError> {
    let sql = format!(
        r#"
        SELECT {EPISODE_COLUMNS}
          FROM episodes
         WHERE user_id = $1
           AND ($2::date IS NULL OR date >= $2)
           AND ($3::date IS NULL OR date <= $3)
         ORDER BY date DESC, id DESC
        OFFSET $4
         LIMIT $5
        "#
    );
    let rows = sqlx::query_as::<_, EpisodeRow>(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(skip)
        .bind(limit)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: i64, id: i64) -> Result<Option<EpisodeRow>, StoreError> {
    let sql = format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE id = $1 AND user_id = $2");
    let row = sqlx::query_as::<_, EpisodeRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn triggers_for(db: &PgPool, episode_ids: &[i64]) -> Result<Vec<TriggerLink>, StoreError> {
    let rows = sqlx::query_as::<_, TriggerLink>(
        r#"
        SELECT et.episode_id, t.id, t.name, t.created_at
          FROM episode_triggers et
          JOIN triggers t ON t.id = et.trigger_id
         WHERE et.episode_id = ANY($1)
         ORDER BY t.name
        "#,
    )
    .bind(episode_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn medications_for(
    db: &PgPool,
    episode_ids: &[i64],
) -> Result<Vec<MedicationLink>, StoreError> {
    let rows = sqlx::query_as::<_, MedicationLink>(
        r#"
        SELECT em.episode_id, m.id, m.name, m.dosage, m.created_at
          FROM episode_medications em
          JOIN medications m ON m.id = em.medication_id
         WHERE em.episode_id = ANY($1)
         ORDER BY m.name
        "#,
    )
    .bind(episode_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn create(db: &PgPool, user_id: i64, req: &EpisodeRequest) -> Result<EpisodeRow, StoreError> {
    let mut tx = db.begin().await?;
    let sql = format!(
        r#"
        INSERT INTO episodes (user_id, date, intensity, duration_minutes, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {EPISODE_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, EpisodeRow>(&sql)
        .bind(user_id)
        .bind(req.date)
        .bind(req.intensity)
        .bind(req.duration_minutes)
        .bind(req.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;
    link(&mut tx, row.id, user_id, req).await?;
    tx.commit().await?;
    Ok(row)
}

/// Full replacement, links included. `None` when the episode is not the user's.
pub async fn replace(
    db: &PgPool,
    user_id: i64,
    id: i64,
    req: &EpisodeRequest,
) -> Result<Option<EpisodeRow>, StoreError> {
    let mut tx = db.begin().await?;
    let sql = format!(
        r#"
        UPDATE episodes
           SET date = $3,
               intensity = $4,
               duration_minutes = $5,
               notes = $6,
               updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {EPISODE_COLUMNS}
        "#
    );
    let Some(row) = sqlx::query_as::<_, EpisodeRow>(&sql)
        .bind(id)
        .bind(user_id)
        .bind(req.date)
        .bind(req.intensity)
        .bind(req.duration_minutes)
        .bind(req.notes.as_deref())
        .fetch_optional(&mut *tx)
        .await?
    else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM episode_triggers WHERE episode_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM episode_medications WHERE episode_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    link(&mut tx, id, user_id, req).await?;
    tx.commit().await?;
    Ok(Some(row))
}

/// Ids that do not belong to the user are dropped silently.
async fn link(
    tx: &mut Transaction<'_, Postgres>,
    episode_id: i64,
    user_id: i64,
    req: &EpisodeRequest,
) -> Result<(), sqlx::Error> {
    if !req.trigger_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO episode_triggers (episode_id, trigger_id)
            SELECT $1, id FROM triggers WHERE user_id = $2 AND id = ANY($3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(episode_id)
        .bind(user_id)
        .bind(&req.trigger_ids)
        .execute(&mut **tx)
        .await?;
    }
    if !req.medication_ids.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO episode_medications (episode_id, medication_id)
            SELECT $1, id FROM medications WHERE user_id = $2 AND id = ANY($3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(episode_id)
        .bind(user_id)
        .bind(&req.medication_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub async fn delete(db: &PgPool, user_id: i64, id: i64) -> Result<bool, StoreError> {
    let done = sqlx::query("DELETE FROM episodes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}
