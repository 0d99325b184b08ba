//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orchard_core::{Email, UserId};

/// A registered user.
///
/// The order lifecycle only ever sees a resolved `UserId`; credentials stay
/// inside the auth service.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Whether the account is active.
    pub is_active: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
