use crate::errors::AuthError;
use crate::types::dto::common::ErrorBody;
use poem_openapi::{payload::Json, ApiResponse};
use std::fmt;

/// Errors for project, submission and review endpoints
#[derive(ApiResponse, Debug)]
pub enum ProjectError {
    /// Caller is not authenticated
    #[oai(status = 401)]
    Unauthorized(Json<ErrorBody>),

    /// Caller may not act on this project or step
    #[oai(status = 403)]
    Forbidden(Json<ErrorBody>),

    /// The step is not accessible or no longer accepts uploads
    #[oai(status = 403)]
    StepLocked(Json<ErrorBody>),

    /// Project, step or submission not found
    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),

    /// Request payload failed validation
    #[oai(status = 400)]
    InvalidRequest(Json<ErrorBody>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

impl ProjectError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ProjectError::Unauthorized(Json(ErrorBody::new("unauthorized", message, 401)))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ProjectError::Forbidden(Json(ErrorBody::new("forbidden", message, 403)))
    }

    pub fn step_locked(message: impl Into<String>) -> Self {
        ProjectError::StepLocked(Json(ErrorBody::new("step_locked", message, 403)))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ProjectError::NotFound(Json(ErrorBody::new("not_found", message, 404)))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ProjectError::InvalidRequest(Json(ErrorBody::new("invalid_request", message, 400)))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ProjectError::InternalError(Json(ErrorBody::new("internal_error", message, 500)))
    }

    pub fn message(&self) -> String {
        match self {
            ProjectError::Unauthorized(json) => json.0.message.clone(),
            ProjectError::Forbidden(json) => json.0.message.clone(),
            ProjectError::StepLocked(json) => json.0.message.clone(),
            ProjectError::NotFound(json) => json.0.message.clone(),
            ProjectError::InvalidRequest(json) => json.0.message.clone(),
            ProjectError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<AuthError> for ProjectError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(json) => ProjectError::InternalError(json),
            other => ProjectError::unauthorized(other.message()),
        }
    }
}
