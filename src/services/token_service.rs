use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::prelude::*;
use std::fmt;

use crate::errors::AuthError;
use crate::services::crypto;
use crate::types::internal::auth::Claims;

/// Manages JWT generation/validation and refresh-token material
pub struct TokenService {
    jwt_secret: String,
    jwt_expiration_minutes: i64,
    refresh_expiration_days: i64,
    refresh_token_secret: String,
    reset_expiration_minutes: i64,
}

impl TokenService {
    /// Create a new TokenService with the given JWT secret and refresh token secret
    pub fn new(jwt_secret: String, refresh_token_secret: String) -> Self {
        Self {
            jwt_secret,
            jwt_expiration_minutes: 15,
            refresh_expiration_days: 7,
            refresh_token_secret,
            reset_expiration_minutes: 60,
        }
    }

    /// Generate a JWT for the given user id and role.
    pub fn generate_jwt(&self, user_id: &str, role: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let expiration = now + (self.jwt_expiration_minutes * 60);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expiration,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::internal_error(format!("Failed to generate JWT: {}", e)))
    }

    /// Validate a JWT and return the claims.
    pub fn validate_jwt(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            if e.to_string().contains("ExpiredSignature") {
                AuthError::expired_token()
            } else {
                AuthError::invalid_token()
            }
        })?;

        Ok(token_data.claims)
    }

    /// Generate a cryptographically secure opaque token (32 random bytes,
    /// base64-encoded). Used for refresh and password-reset tokens.
    pub fn generate_opaque_token(&self) -> String {
        let mut rng = rand::rng();
        let random_bytes: [u8; 32] = rng.random();
        general_purpose::STANDARD.encode(random_bytes)
    }

    /// Hash an opaque token with HMAC-SHA256 for at-rest storage.
    pub fn hash_opaque_token(&self, token: &str) -> String {
        crypto::hmac_sha256_token(&self.refresh_token_secret, token)
    }

    /// Access-token lifetime in seconds, for token responses.
    pub fn access_expires_in(&self) -> i64 {
        self.jwt_expiration_minutes * 60
    }

    /// Expiration timestamp for a refresh token issued now.
    pub fn refresh_expiration(&self) -> i64 {
        Utc::now().timestamp() + (self.refresh_expiration_days * 24 * 60 * 60)
    }

    /// Expiration timestamp for a password-reset token issued now.
    pub fn reset_expiration(&self) -> i64 {
        Utc::now().timestamp() + (self.reset_expiration_minutes * 60)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("refresh_expiration_days", &self.refresh_expiration_days)
            .field("refresh_token_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TokenService {{ jwt_expiration: {}min, refresh_expiration: {}days }}",
            self.jwt_expiration_minutes, self.refresh_expiration_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_service() -> TokenService {
        TokenService::new(
            "test-secret-key-minimum-32-characters-long".to_string(),
            "test-refresh-secret-minimum-32-chars".to_string(),
        )
    }

    #[test]
    fn test_generate_jwt_roundtrips_through_validation() {
        let service = test_service();
        let user_id = Uuid::new_v4().to_string();

        let token = service.generate_jwt(&user_id, "student").unwrap();
        let claims = service.validate_jwt(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "student");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_validate_jwt_rejects_wrong_secret() {
        let service = test_service();
        let other = TokenService::new(
            "another-secret-key-minimum-32-chars-x".to_string(),
            "test-refresh-secret-minimum-32-chars".to_string(),
        );

        let token = service.generate_jwt("user-1", "teacher").unwrap();
        let result = other.validate_jwt(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_validate_jwt_rejects_expired_token() {
        let service = test_service();

        let now = Utc::now().timestamp();
        let expired_claims = Claims {
            sub: "user-1".to_string(),
            role: "student".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let expired_token = encode(
            &Header::new(Algorithm::HS256),
            &expired_claims,
            &EncodingKey::from_secret("test-secret-key-minimum-32-characters-long".as_bytes()),
        )
        .unwrap();

        let result = service.validate_jwt(&expired_token);

        assert!(matches!(result, Err(AuthError::ExpiredToken(_))));
    }

    #[test]
    fn test_opaque_tokens_are_unique_and_encoded() {
        let service = test_service();

        let token1 = service.generate_opaque_token();
        let token2 = service.generate_opaque_token();

        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 44);
    }

    #[test]
    fn test_hash_opaque_token_is_stable() {
        let service = test_service();

        let hash1 = service.hash_opaque_token("some-token");
        let hash2 = service.hash_opaque_token("some-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_refresh_expiration_is_seven_days_out() {
        let service = test_service();

        let now = Utc::now().timestamp();
        let expires = service.refresh_expiration();

        let diff = expires - now;
        assert!((diff - 7 * 24 * 60 * 60).abs() < 5);
    }
}
