use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::{
    dto::{Trigger, TriggerRequest},
    repo,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    extract::IdPath,
    state::AppState,
};

const NOT_FOUND: &str = "Trigger not found";
const ALREADY_REGISTERED: &str = "Trigger already registered";
const NAME_TAKEN: &str = "Another trigger already has this name";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_triggers).post(create_trigger))
        .route(
            "/:id",
            get(get_trigger).put(update_trigger).delete(delete_trigger),
        )
}

#[instrument(skip(state, user, payload))]
pub async fn create_trigger(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TriggerRequest>,
) -> Result<(StatusCode, Json<Trigger>), AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    if repo::find_by_name(&state.db, user.id, &payload.name).await?.is_some() {
        return Err(AppError::Conflict(ALREADY_REGISTERED.into()));
    }
    let trigger = repo::create(&state.db, user.id, &payload.name)
        .await
        .map_err(|e| AppError::from_store(e, ALREADY_REGISTERED))?;

    info!(user_id = user.id, trigger_id = trigger.id, "trigger created");
    Ok((StatusCode::CREATED, Json(trigger)))
}

#[instrument(skip(state, user))]
pub async fn list_triggers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Trigger>>, AppError> {
    Ok(Json(repo::list_by_user(&state.db, user.id).await?))
}

#[instrument(skip(state, user))]
pub async fn get_trigger(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<Json<Trigger>, AppError> {
    repo::get(&state.db, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))
}

#[instrument(skip(state, user, payload))]
pub async fn update_trigger(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
    Json(payload): Json<TriggerRequest>,
) -> Result<Json<Trigger>, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    if repo::get(&state.db, user.id, id).await?.is_none() {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    if let Some(existing) = repo::find_by_name(&state.db, user.id, &payload.name).await? {
        if existing.id != id {
            return Err(AppError::Conflict(NAME_TAKEN.into()));
        }
    }
    let trigger = repo::rename(&state.db, user.id, id, &payload.name)
        .await
        .map_err(|e| AppError::from_store(e, NAME_TAKEN))?;
    Ok(Json(trigger))
}

#[instrument(skip(state, user))]
pub async fn delete_trigger(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !repo::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    info!(user_id = user.id, trigger_id = id, "trigger deleted");
    Ok(StatusCode::NO_CONTENT)
}
