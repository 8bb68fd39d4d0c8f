use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for account signup
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Login email
    pub email: String,

    /// Password for the new account
    pub password: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Requested role ("student" or "teacher")
    pub role: String,

    /// For students: id of the supervising teacher
    pub teacher_id: Option<String>,

    /// For teachers: the current signup access code
    pub access_code: Option<String>,

    /// For students: optional project title, defaulted when absent
    pub project_title: Option<String>,
}

/// Response model for signup
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    /// Id of the created account
    pub user_id: String,

    /// Role the account was created with
    pub role: String,
}

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email for authentication
    pub email: String,

    /// Password for authentication
    pub password: String,
}

/// Response model containing authentication tokens
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,
}

/// Request model for token refresh
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token to exchange for a new access token
    pub refresh_token: String,
}

/// Response model for token refresh
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New JWT access token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,
}

/// Request model for logout
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke
    pub refresh_token: String,
}

/// Response model for logout
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Success message
    pub message: String,
}

/// Validated profile of the authenticated user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// User id
    pub id: String,

    /// Login email
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Role name ("student" | "teacher" | "admin")
    pub role: String,

    /// For students: id of the supervising teacher
    pub teacher_id: Option<String>,
}

/// Request model for editing the caller's profile
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New first name
    pub first_name: String,

    /// New last name
    pub last_name: String,
}

/// Request model for starting a password reset
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    /// Email of the account to reset
    pub email: String,
}

/// Request model for completing a password reset
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct PasswordResetConfirmRequest {
    /// Reset token from the email
    pub token: String,

    /// New password to set
    pub new_password: String,
}
