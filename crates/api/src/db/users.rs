//! User repository for database operations.
//!
//! Covers local accounts, their password hashes, and single-use password
//! reset tokens. Credentials live in side tables so the `users` row stays
//! credential-agnostic.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use orchard_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, is_active, created_at FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email)
            VALUES ($1)
            RETURNING id, email, is_active, created_at
            ",
        )
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        let user = User::try_from(row)?;

        sqlx::query(
            r"
            INSERT INTO user_passwords (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: UserId,
            email: String,
            is_active: bool,
            created_at: DateTime<Utc>,
            password_hash: Option<String>,
        }

        let row = sqlx::query_as::<_, Row>(
            r"
            SELECT u.id, u.email, u.is_active, u.created_at, p.password_hash
            FROM users u
            LEFT JOIN user_passwords p ON u.id = p.user_id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        let user = User::try_from(UserRow {
            id: r.id,
            email: r.email,
            is_active: r.is_active,
            created_at: r.created_at,
        })?;

        Ok(Some((user, password_hash)))
    }

    /// Update a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO user_passwords (user_id, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET password_hash = EXCLUDED.password_hash
            ",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Store a password reset token for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_reset_token(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO password_reset_tokens (user_id, token)
            VALUES ($1, $2)
            ",
        )
        .bind(user_id)
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Consume an unused reset token, returning the owning user id.
    ///
    /// Marking the token used and reading it happen in one statement, so a
    /// token can be consumed at most once even under concurrent resets.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn consume_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let user_id: Option<UserId> = sqlx::query_scalar(
            r"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE token = $1 AND used = FALSE
            RETURNING user_id
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(user_id)
    }
}
