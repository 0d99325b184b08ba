//! Authentication extractors backed by the session.
//!
//! Handlers take [`CurrentUser`] when a login is required and
//! [`OptionalUser`] when the route works for anonymous visitors too
//! (e.g., cart creation). Only the resolved user ever crosses this
//! boundary; credentials stay in the auth service.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

use orchard_core::UserId;

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::models::session_keys;
use crate::state::AppState;

/// Extractor requiring an authenticated user. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extractor resolving the user if a session exists, `None` otherwise.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

/// Store the authenticated user id in the session.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session store fails.
pub async fn set_current_user(session: &Session, user_id: UserId) -> Result<(), AppError> {
    session
        .insert(session_keys::USER_ID, user_id)
        .await
        .map_err(|e| AppError::Internal(format!("session store failed: {e}")))
}

/// Clear the session on logout.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), AppError> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session store failed: {e}")))
}

async fn resolve_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let session = Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::Internal(format!("session layer missing: {msg}")))?;

    let user_id: Option<UserId> = session
        .get(session_keys::USER_ID)
        .await
        .map_err(|e| AppError::Internal(format!("session read failed: {e}")))?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };

    // A stale session may reference a deleted user; treat as logged out.
    let user = UserRepository::new(state.pool()).get_by_id(user_id).await?;
    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_user(parts, state).await?))
    }
}
