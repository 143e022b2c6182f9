use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::dto::UpdateUserRequest;
use crate::{
    auth::{
        dto::{PublicUser, RegisterRequest},
        extractors::CurrentUser,
        services::{register_user, EMAIL_TAKEN},
    },
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/me", get(read_me).put(update_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    payload.validate()?;
    let user = register_user(
        state.users.as_ref(),
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(user))]
pub async fn read_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    payload.validate()?;
    let updated = state
        .users
        .update_profile(user.id, payload.name.as_deref(), payload.email.as_deref())
        .await
        .map_err(|e| AppError::from_store(e, EMAIL_TAKEN))?;
    info!(user_id = user.id, "profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, user))]
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.users.delete(user.id).await?;
    info!(user_id = user.id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
