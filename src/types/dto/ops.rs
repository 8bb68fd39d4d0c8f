use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// Request model for the email existence check
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CheckUserEmailRequest {
    /// Email to look up
    pub email: String,
}

/// Response model for the email existence check
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CheckUserEmailResponse {
    /// True when the email is known to either the profile collection or the
    /// identity provider
    pub exists: bool,
}

/// Request model for cascading student deletion
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct DeleteStudentRequest {
    /// Id of the student to delete
    pub student_id: String,
}

/// Request model for cascading teacher deletion
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct DeleteTeacherRequest {
    /// Id of the teacher to delete
    pub teacher_id: String,
}

/// Outcome of one best-effort identity deletion
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct AuthDeletionOutcome {
    /// The identity this outcome refers to
    pub user_id: String,

    /// Whether the identity record was removed
    pub deleted: bool,

    /// Failure detail when it was not
    pub error: Option<String>,
}

/// Result of a cascading deletion.
///
/// `success` reflects the data-store batch only; identity-provider failures
/// after a committed batch are reported per id and never fail the call.
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Whether the data-store cascade committed
    pub success: bool,

    /// Human-readable summary
    pub message: String,

    /// Per-identity deletion outcomes, one entry per affected account
    pub auth_results: Vec<AuthDeletionOutcome>,
}

/// Request model for sending a signup invitation
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SendInviteRequest {
    /// Recipient email
    pub email: String,

    /// Role the recipient is being invited as
    pub role: String,

    /// Signup link to embed in the email
    pub signup_url: String,
}

/// Response model for sending a signup invitation
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SendInviteResponse {
    /// Whether the email was accepted by the delivery provider
    pub success: bool,
}
