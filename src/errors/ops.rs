use crate::types::dto::common::ErrorBody;
use poem_openapi::{payload::Json, ApiResponse};
use std::fmt;

/// Errors for the service-credentialed ops endpoints
#[derive(ApiResponse, Debug)]
pub enum OpsError {
    /// Service key missing or wrong
    #[oai(status = 401)]
    Unauthorized(Json<ErrorBody>),

    /// Missing or blank required field
    #[oai(status = 400)]
    InvalidRequest(Json<ErrorBody>),

    /// Target entity not found
    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),

    /// Required service configuration is absent
    #[oai(status = 500)]
    ConfigError(Json<ErrorBody>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

impl OpsError {
    pub fn unauthorized() -> Self {
        OpsError::Unauthorized(Json(ErrorBody::new(
            "unauthorized",
            "A valid service key is required",
            401,
        )))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        OpsError::InvalidRequest(Json(ErrorBody::new("invalid_request", message, 400)))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        OpsError::NotFound(Json(ErrorBody::new("not_found", message, 404)))
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        OpsError::ConfigError(Json(ErrorBody::new("config_error", message, 500)))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        OpsError::InternalError(Json(ErrorBody::new("internal_error", message, 500)))
    }

    pub fn message(&self) -> String {
        match self {
            OpsError::Unauthorized(json) => json.0.message.clone(),
            OpsError::InvalidRequest(json) => json.0.message.clone(),
            OpsError::NotFound(json) => json.0.message.clone(),
            OpsError::ConfigError(json) => json.0.message.clone(),
            OpsError::InternalError(json) => json.0.message.clone(),
        }
    }
}

impl fmt::Display for OpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
