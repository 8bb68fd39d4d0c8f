use crate::types::dto::common::ErrorBody;
use poem_openapi::{payload::Json, ApiResponse};
use std::fmt;

/// Authentication and signup error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Invalid email or password
    #[oai(status = 401)]
    InvalidCredentials(Json<ErrorBody>),

    /// Email already registered
    #[oai(status = 400)]
    DuplicateEmail(Json<ErrorBody>),

    /// Request payload failed validation
    #[oai(status = 400)]
    InvalidRequest(Json<ErrorBody>),

    /// Teacher signup code did not match
    #[oai(status = 403)]
    InvalidAccessCode(Json<ErrorBody>),

    /// Invalid or malformed JWT
    #[oai(status = 401)]
    InvalidToken(Json<ErrorBody>),

    /// JWT has expired
    #[oai(status = 401)]
    ExpiredToken(Json<ErrorBody>),

    /// Invalid refresh token
    #[oai(status = 401)]
    InvalidRefreshToken(Json<ErrorBody>),

    /// Refresh token has expired
    #[oai(status = 401)]
    ExpiredRefreshToken(Json<ErrorBody>),

    /// Invalid or expired password-reset token
    #[oai(status = 401)]
    InvalidResetToken(Json<ErrorBody>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(Json(ErrorBody::new(
            "invalid_credentials",
            "Invalid email or password",
            401,
        )))
    }

    pub fn duplicate_email() -> Self {
        AuthError::DuplicateEmail(Json(ErrorBody::new(
            "duplicate_email",
            "An account with this email already exists",
            400,
        )))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AuthError::InvalidRequest(Json(ErrorBody::new("invalid_request", message, 400)))
    }

    pub fn invalid_access_code() -> Self {
        AuthError::InvalidAccessCode(Json(ErrorBody::new(
            "invalid_access_code",
            "The signup code is not valid",
            403,
        )))
    }

    pub fn invalid_token() -> Self {
        AuthError::InvalidToken(Json(ErrorBody::new(
            "invalid_token",
            "Invalid or malformed JWT",
            401,
        )))
    }

    pub fn expired_token() -> Self {
        AuthError::ExpiredToken(Json(ErrorBody::new("expired_token", "JWT has expired", 401)))
    }

    pub fn invalid_refresh_token() -> Self {
        AuthError::InvalidRefreshToken(Json(ErrorBody::new(
            "invalid_refresh_token",
            "Invalid refresh token",
            401,
        )))
    }

    pub fn expired_refresh_token() -> Self {
        AuthError::ExpiredRefreshToken(Json(ErrorBody::new(
            "expired_refresh_token",
            "Refresh token has expired",
            401,
        )))
    }

    pub fn invalid_reset_token() -> Self {
        AuthError::InvalidResetToken(Json(ErrorBody::new(
            "invalid_reset_token",
            "Password-reset token is invalid or has expired",
            401,
        )))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        AuthError::InternalError(Json(ErrorBody::new("internal_error", message, 500)))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(json) => json.0.message.clone(),
            AuthError::DuplicateEmail(json) => json.0.message.clone(),
            AuthError::InvalidRequest(json) => json.0.message.clone(),
            AuthError::InvalidAccessCode(json) => json.0.message.clone(),
            AuthError::InvalidToken(json) => json.0.message.clone(),
            AuthError::ExpiredToken(json) => json.0.message.clone(),
            AuthError::InvalidRefreshToken(json) => json.0.message.clone(),
            AuthError::ExpiredRefreshToken(json) => json.0.message.clone(),
            AuthError::InvalidResetToken(json) => json.0.message.clone(),
            AuthError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
