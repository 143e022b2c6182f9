use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::{
    dto::{Episode, EpisodeQuery, EpisodeRequest},
    repo, services,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    extract::{IdPath, QueryParams},
    state::AppState,
};

const NOT_FOUND: &str = "Episode not found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_episodes).post(create_episode))
        .route(
            "/:id",
            get(get_episode).put(update_episode).delete(delete_episode),
        )
}

#[instrument(skip(state, user, payload))]
pub async fn create_episode(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<EpisodeRequest>,
) -> Result<(StatusCode, Json<Episode>), AppError> {
    payload.validate()?;
    let row = repo::create(&state.db, user.id, &payload).await?;
    info!(user_id = user.id, episode_id = row.id, "episode recorded");
    let episode = services::hydrate_one(&state.db, row).await?;
    Ok((StatusCode::CREATED, Json(episode)))
}

#[instrument(skip(state, user))]
pub async fn list_episodes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<EpisodeQuery>,
) -> Result<Json<Vec<Episode>>, AppError> {
    query.validate()?;
    let rows = repo::list_by_user(
        &state.db,
        user.id,
        query.skip,
        query.limit,
        query.start_date,
        query.end_date,
    )
    .await?;
    Ok(Json(services::hydrate(&state.db, rows).await?))
}

#[instrument(skip(state, user))]
pub async fn get_episode(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<Json<Episode>, AppError> {
    let row = repo::get(&state.db, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    Ok(Json(services::hydrate_one(&state.db, row).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn update_episode(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
    Json(payload): Json<EpisodeRequest>,
) -> Result<Json<Episode>, AppError> {
    payload.validate()?;
    let row = repo::replace(&state.db, user.id, id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    Ok(Json(services::hydrate_one(&state.db, row).await?))
}

#[instrument(skip(state, user))]
pub async fn delete_episode(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !repo::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    info!(user_id = user.id, episode_id = id, "episode deleted");
    Ok(StatusCode::NO_CONTENT)
}
