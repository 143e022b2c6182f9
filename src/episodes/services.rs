use std::collections::HashMap;

use sqlx::PgPool;

use super::{
    dto::{Episode, EpisodeRow},
    repo,
};
use crate::users::repo::StoreError;

/// Attaches linked triggers and medications, two queries regardless of row count.
pub async fn hydrate(db: &PgPool, rows: Vec<EpisodeRow>) -> Result<Vec<Episode>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let mut triggers: HashMap<i64, Vec<_>> = HashMap::new();
    for link in repo::triggers_for(db, &ids).await? {
        triggers.entry(link.episode_id).or_default().push(link.trigger);
    }
    let mut medications: HashMap<i64, Vec<_>> = HashMap::new();
    for link in repo::medications_for(db, &ids).await? {
        medications.entry(link.episode_id).or_default().push(link.medication);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            Episode::from_row(
                row,
                triggers.remove(&id).unwrap_or_default(),
                medications.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

pub async fn hydrate_one(db: &PgPool, row: EpisodeRow) -> Result<Episode, StoreError> {
    let mut episodes = hydrate(db, vec![row]).await?;
    episodes
        .pop()
        .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
}
