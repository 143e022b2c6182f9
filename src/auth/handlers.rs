use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{
        claims::TokenKind,
        dto::{
            ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, TokenResponse,
        },
        extractors::CurrentUser,
        password::verify_password,
        services::{authenticate_credentials, register_user, set_password},
    },
    error::AppError,
    mail,
    state::AppState,
};

pub const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, instructions have been sent.";
pub const PASSWORD_CHANGED_MESSAGE: &str = "Password changed successfully";
pub const WRONG_CURRENT_PASSWORD: &str = "Current password is incorrect";
pub const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
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

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;
    let user = authenticate_credentials(state.users.as_ref(), &payload.email, &payload.password).await?;
    let token = state.keys.issue_access(&user.email)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(user))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    if !verify_password(&payload.current_password, &user.password_hash) {
        warn!(user_id = user.id, "change-password with wrong current password");
        return Err(AppError::BadRequest(WRONG_CURRENT_PASSWORD.into()));
    }
    set_password(state.users.as_ref(), &user, &payload.new_password).await?;
    Ok(Json(MessageResponse::new(PASSWORD_CHANGED_MESSAGE)))
}

/// Same answer whether or not the account exists; the mail goes out after the response.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    if let Some(user) = state.users.find_by_email(&payload.email).await? {
        let token = state.keys.issue_reset(&user.email)?;
        match &state.mailer {
            Some(mailer) => {
                let message = mail::password_reset_mail(
                    &user.email,
                    &state.config.frontend_url,
                    &token,
                    state.config.jwt.reset_ttl_minutes,
                );
                mail::dispatch(mailer.clone(), message);
                info!(user_id = user.id, "password reset requested");
            }
            None => warn!(user_id = user.id, "no mail transport; reset link not sent"),
        }
    }
    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let claims = state
        .keys
        .verify_kind(&payload.token, TokenKind::PasswordReset)
        .map_err(|reason| {
            warn!(%reason, "reset token rejected");
            AppError::BadRequest(INVALID_RESET_TOKEN.into())
        })?;
    let Some(user) = state.users.find_by_email(&claims.sub).await? else {
        warn!("reset token subject no longer exists");
        return Err(AppError::BadRequest(INVALID_RESET_TOKEN.into()));
    };
    set_password(state.users.as_ref(), &user, &payload.new_password).await?;
    Ok(Json(MessageResponse::new(PASSWORD_CHANGED_MESSAGE)))
}
