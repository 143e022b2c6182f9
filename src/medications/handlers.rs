use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::{
    dto::{CreateMedicationRequest, Medication, UpdateMedicationRequest},
    repo,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    extract::IdPath,
    state::AppState,
};

const NOT_FOUND: &str = "Medication not found";
const ALREADY_REGISTERED: &str = "Medication already registered";
const NAME_TAKEN: &str = "Another medication already has this name";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_medications).post(create_medication))
        .route(
            "/:id",
            get(get_medication)
                .put(update_medication)
                .delete(delete_medication),
        )
}

#[instrument(skip(state, user, payload))]
pub async fn create_medication(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<Medication>), AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    if repo::find_by_name(&state.db, user.id, &payload.name).await?.is_some() {
        return Err(AppError::Conflict(ALREADY_REGISTERED.into()));
    }
    let medication = repo::create(&state.db, user.id, &payload.name, payload.dosage.as_deref())
        .await
        .map_err(|e| AppError::from_store(e, ALREADY_REGISTERED))?;

    info!(user_id = user.id, medication_id = medication.id, "medication created");
    Ok((StatusCode::CREATED, Json(medication)))
}

#[instrument(skip(state, user))]
pub async fn list_medications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Medication>>, AppError> {
    Ok(Json(repo::list_by_user(&state.db, user.id).await?))
}

#[instrument(skip(state, user))]
pub async fn get_medication(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<Json<Medication>, AppError> {
    repo::get(&state.db, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))
}

#[instrument(skip(state, user, payload))]
pub async fn update_medication(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
    Json(payload): Json<UpdateMedicationRequest>,
) -> Result<Json<Medication>, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    if repo::get(&state.db, user.id, id).await?.is_none() {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    if let Some(name) = payload.name.as_deref() {
        if let Some(existing) = repo::find_by_name(&state.db, user.id, name).await? {
            if existing.id != id {
                return Err(AppError::Conflict(NAME_TAKEN.into()));
            }
        }
    }
    let medication = repo::update(
        &state.db,
        user.id,
        id,
        payload.name.as_deref(),
        payload.dosage.as_deref(),
    )
    .await
    .map_err(|e| AppError::from_store(e, NAME_TAKEN))?;
    Ok(Json(medication))
}

#[instrument(skip(state, user))]
pub async fn delete_medication(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if !repo::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    info!(user_id = user.id, medication_id = id, "medication deleted");
    Ok(StatusCode::NO_CONTENT)
}
