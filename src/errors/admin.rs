use crate::errors::{AuthError, ProjectError};
use crate::types::dto::common::ErrorBody;
use poem_openapi::{payload::Json, ApiResponse};
use std::fmt;

/// Errors for admin endpoints (access code, theme, certification)
#[derive(ApiResponse, Debug)]
pub enum AdminError {
    /// Caller is not authenticated
    #[oai(status = 401)]
    Unauthorized(Json<ErrorBody>),

    /// Caller is not an admin
    #[oai(status = 403)]
    Forbidden(Json<ErrorBody>),

    /// Target record not found
    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),

    /// Request payload failed validation, or the project is not eligible
    #[oai(status = 400)]
    InvalidRequest(Json<ErrorBody>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

impl AdminError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AdminError::Unauthorized(Json(ErrorBody::new("unauthorized", message, 401)))
    }

    pub fn forbidden() -> Self {
        AdminError::Forbidden(Json(ErrorBody::new(
            "forbidden",
            "Admin privileges required",
            403,
        )))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AdminError::NotFound(Json(ErrorBody::new("not_found", message, 404)))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AdminError::InvalidRequest(Json(ErrorBody::new("invalid_request", message, 400)))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        AdminError::InternalError(Json(ErrorBody::new("internal_error", message, 500)))
    }

    pub fn message(&self) -> String {
        match self {
            AdminError::Unauthorized(json) => json.0.message.clone(),
            AdminError::Forbidden(json) => json.0.message.clone(),
            AdminError::NotFound(json) => json.0.message.clone(),
            AdminError::InvalidRequest(json) => json.0.message.clone(),
            AdminError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<AuthError> for AdminError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(json) => AdminError::InternalError(json),
            other => AdminError::unauthorized(other.message()),
        }
    }
}

impl From<ProjectError> for AdminError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::NotFound(json) => AdminError::NotFound(json),
            ProjectError::InvalidRequest(json) => AdminError::InvalidRequest(json),
            ProjectError::InternalError(json) => AdminError::InternalError(json),
            other => AdminError::invalid_request(other.message()),
        }
    }
}
