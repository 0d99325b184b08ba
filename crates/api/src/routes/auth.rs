//! Authentication route handlers.
//!
//! Session-based: a successful login stores the user id in the session and
//! every later request resolves it through the extractors in
//! `middleware::auth`. Reset tokens are returned to no one; in a full
//! deployment they go out by email.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{CurrentUser, clear_current_user, set_current_user};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// POST /auth/register - Create an account and log it in.
#[instrument(skip(state, session, req))]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .register(&req.email, &req.password)
        .await?;

    set_current_user(&session, user.id).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login - Authenticate and establish a session.
#[instrument(skip(state, session, req))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;

    set_current_user(&session, user.id).await?;

    Ok(Json(user))
}

/// POST /auth/logout - Destroy the session.
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_user(&session).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// GET /auth/me - Return the authenticated user.
#[instrument(skip(user))]
async fn me(CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    Ok(Json(user))
}

/// POST /auth/forgot-password - Create a reset token.
///
/// Responds identically whether or not the account exists, to avoid
/// leaking which emails are registered.
#[instrument(skip(state, req))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse> {
    let _token = AuthService::new(state.pool())
        .create_password_reset(&req.email)
        .await?;

    Ok(Json(json!({ "status": "ok" })))
}

/// POST /auth/reset-password - Consume a reset token and set a new password.
#[instrument(skip(state, req))]
async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    AuthService::new(state.pool())
        .reset_password(&req.token, &req.new_password)
        .await?;

    Ok(Json(json!({ "status": "ok" })))
}
