use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::errors::AuthError;
use crate::types::db::credential::{self, ActiveModel, Entity as Credential};
use crate::types::db::password_reset_token::{
    ActiveModel as ResetTokenActiveModel, Column as ResetTokenColumn, Entity as ResetToken,
};
use crate::types::db::refresh_token::{
    ActiveModel as RefreshTokenActiveModel, Column as RefreshTokenColumn, Entity as RefreshToken,
};

/// CredentialStore is the identity provider: it owns login credentials,
/// refresh tokens and password-reset tokens. Profile data lives elsewhere.
///
/// Methods take a connection so callers can run them inside a transaction
/// alongside profile writes.
pub struct CredentialStore {
    password_pepper: String,
}

impl CredentialStore {
    /// Create a new CredentialStore with the given password pepper
    pub fn new(password_pepper: String) -> Self {
        Self { password_pepper }
    }

    fn argon2(&self) -> Result<Argon2<'_>, AuthError> {
        Argon2::new_with_secret(
            self.password_pepper.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| AuthError::internal_error(format!("Failed to initialize Argon2: {}", e)))
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        Ok(self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::internal_error(format!("Password hashing error: {}", e)))?
            .to_string())
    }

    /// Create a new account and return its generated user id.
    ///
    /// # Arguments
    /// * `conn` - Connection or transaction to run against
    /// * `email` - Login email, unique across accounts
    /// * `password` - Plaintext password to hash and store
    ///
    /// # Returns
    /// * `Ok(String)` - The user_id (UUID) of the created account
    /// * `Err(AuthError)` - DuplicateEmail if the email is taken, or InternalError
    pub async fn add_account(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let existing = Credential::find()
            .filter(credential::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?;

        if existing.is_some() {
            return Err(AuthError::duplicate_email());
        }

        let user_id = Uuid::new_v4().to_string();
        let password_hash = self.hash_password(password)?;

        let new_account = ActiveModel {
            id: Set(user_id.clone()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().timestamp()),
        };

        new_account.insert(conn).await.map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                AuthError::duplicate_email()
            } else {
                AuthError::internal_error(format!("Database error: {}", e))
            }
        })?;

        Ok(user_id)
    }

    /// Verify credentials and return the user id on success.
    pub async fn verify_credentials(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let account = Credential::find()
            .filter(credential::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|_| AuthError::invalid_credentials())?
            .ok_or_else(AuthError::invalid_credentials)?;

        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|_| AuthError::invalid_credentials())?;

        self.argon2()
            .map_err(|_| AuthError::invalid_credentials())?
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::invalid_credentials())?;

        Ok(account.id)
    }

    /// Check whether an account exists for the given email.
    pub async fn email_exists(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<bool, AuthError> {
        let account = Credential::find()
            .filter(credential::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?;

        Ok(account.is_some())
    }

    /// Delete an account by user id.
    ///
    /// Refresh and reset tokens go with it. Returns whether an account row
    /// actually existed.
    pub async fn delete_account(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<bool, AuthError> {
        RefreshToken::delete_many()
            .filter(RefreshTokenColumn::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to delete refresh tokens: {}", e)))?;

        ResetToken::delete_many()
            .filter(ResetTokenColumn::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to delete reset tokens: {}", e)))?;

        let result = Credential::delete_many()
            .filter(credential::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to delete account: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// Replace an account's password.
    pub async fn set_password(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let account = Credential::find_by_id(user_id)
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?
            .ok_or_else(AuthError::invalid_credentials)?;

        let password_hash = self.hash_password(new_password)?;

        let mut active: ActiveModel = account.into();
        active.password_hash = Set(password_hash);
        active
            .update(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to update password: {}", e)))?;

        Ok(())
    }

    /// Store a refresh token hash for a user.
    pub async fn store_refresh_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: String,
        user_id: String,
        expires_at: i64,
    ) -> Result<(), AuthError> {
        let new_token = RefreshTokenActiveModel {
            token_hash: Set(token_hash),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now().timestamp()),
        };

        new_token
            .insert(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to store refresh token: {}", e)))?;

        Ok(())
    }

    /// Validate a refresh token hash and return the associated user id.
    pub async fn validate_refresh_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<String, AuthError> {
        let token = RefreshToken::find_by_id(token_hash)
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?
            .ok_or_else(AuthError::invalid_refresh_token)?;

        if token.expires_at < Utc::now().timestamp() {
            return Err(AuthError::expired_refresh_token());
        }

        Ok(token.user_id)
    }

    /// Revoke a refresh token, returning the user id it belonged to.
    pub async fn revoke_refresh_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<String, AuthError> {
        let token = RefreshToken::find_by_id(token_hash)
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to query refresh token: {}", e)))?
            .ok_or_else(AuthError::invalid_refresh_token)?;

        let user_id = token.user_id.clone();

        RefreshToken::delete_by_id(token_hash)
            .exec(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to revoke refresh token: {}", e)))?;

        Ok(user_id)
    }

    /// Store a password-reset token hash for the account with this email.
    ///
    /// Returns the user id when the email is known, None otherwise so the
    /// caller can answer identically either way.
    pub async fn store_reset_token(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        token_hash: String,
        expires_at: i64,
    ) -> Result<Option<String>, AuthError> {
        let account = Credential::find()
            .filter(credential::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?;

        let Some(account) = account else {
            return Ok(None);
        };

        let new_token = ResetTokenActiveModel {
            token_hash: Set(token_hash),
            user_id: Set(account.id.clone()),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now().timestamp()),
        };

        new_token
            .insert(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to store reset token: {}", e)))?;

        Ok(Some(account.id))
    }

    /// Consume a password-reset token: single use, expiry checked.
    ///
    /// # Returns
    /// * `Ok(String)` - The user id the token was issued for
    /// * `Err(AuthError::InvalidResetToken)` - Unknown or expired token
    pub async fn consume_reset_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<String, AuthError> {
        let token = ResetToken::find_by_id(token_hash)
            .one(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?
            .ok_or_else(AuthError::invalid_reset_token)?;

        ResetToken::delete_by_id(token_hash)
            .exec(conn)
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to consume reset token: {}", e)))?;

        if token.expires_at < Utc::now().timestamp() {
            return Err(AuthError::invalid_reset_token());
        }

        Ok(token.user_id)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("password_pepper", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Display for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialStore {{ password_pepper: <redacted> }}")
    }
}
