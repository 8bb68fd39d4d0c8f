use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Current teacher-signup access code
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AccessCodeResponse {
    /// The access code teachers must present at signup
    pub access_code: String,
}

/// Request model for rotating the access code
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateAccessCodeRequest {
    /// New access code; omit to have one generated
    pub access_code: Option<String>,
}

/// Active UI theme name
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ThemeResponse {
    /// Theme name
    pub theme: String,
}

/// Request model for switching the UI theme
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateThemeRequest {
    /// Theme name to activate
    pub theme: String,
}

/// Request model for the certification ruling on a project
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CertificationRequest {
    /// true to certify, false to send step 5 back for revision
    pub approved: bool,

    /// Optional comments; rejections get a default message when omitted
    pub comments: Option<String>,
}

/// Response model for admin actions
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct AdminActionResponse {
    /// Success message
    pub message: String,
}
