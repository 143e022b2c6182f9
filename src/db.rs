use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

const TABLES: [&str; 6] = [
    "users",
    "episodes",
    "triggers",
    "medications",
    "episode_triggers",
    "episode_medications",
];

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

/// Applies embedded migrations, then logs row counts so data loss between deploys is visible.
pub async fn prepare(db: &PgPool) {
    if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
        warn!(error = %e, "migration failed; continuing with existing schema");
    }
    log_table_counts(db).await;
}

async fn log_table_counts(db: &PgPool) {
    for table in TABLES {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        match sqlx::query_scalar::<_, i64>(&sql).fetch_one(db).await {
            Ok(count) => info!(table, count, "table row count"),
            Err(e) => warn!(table, error = %e, "failed to count rows"),
        }
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
