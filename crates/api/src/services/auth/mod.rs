//! Authentication service.
//!
//! Password-based registration and login plus single-use password reset
//! tokens. The rest of the system consumes this as an opaque capability:
//! handlers only ever see a resolved [`User`], never raw credentials.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distr::Alphanumeric};
use sqlx::PgPool;
use tracing::info;

use orchard_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of generated password reset tokens.
const RESET_TOKEN_LENGTH: usize = 48;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid,
    /// `AuthError::WeakPassword` if the password doesn't meet requirements,
    /// and `AuthError::UserAlreadyExists` if the email is registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "user registered");

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Create a password reset token for an email address.
    ///
    /// Returns `None` when no account exists for the email; callers should
    /// respond identically either way to avoid account enumeration. The
    /// token itself would be emailed out of band.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on store failure.
    pub async fn create_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let email = Email::parse(email)?;

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token();
        self.users.create_reset_token(user.id, &token).await?;

        info!(user_id = %user.id, "password reset token created");

        Ok(Some(token))
    }

    /// Apply a password reset: consume the token and set the new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or
    /// already used, and `AuthError::WeakPassword` for a bad new password.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let user_id = self
            .users
            .consume_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;

        info!(%user_id, "password reset applied");

        Ok(())
    }
}

/// Validate password strength requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random alphanumeric reset token.
fn generate_reset_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").expect("hashing succeeds");
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("correct horse battery").expect("hashing succeeds");
        assert!(matches!(
            verify_password("wrong password here", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password!").expect("hash");
        let b = hash_password("same password!").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_reset_token());
    }
}
