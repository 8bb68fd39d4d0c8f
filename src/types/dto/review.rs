use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::dto::project::ProjectResponse;

/// Request model for sending a step back with a comment
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Feedback for the student
    pub comment: String,
}

/// Request model for approving a step
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Optional feedback for the student
    pub comment: Option<String>,
}

/// Request model for grading a project
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct GradeRequest {
    /// Grade to record; null clears it
    pub grade: Option<String>,
}

/// Response model for review actions
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ReviewActionResponse {
    /// Success message
    pub message: String,
}

/// One entry of the append-only comment log for a step
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct StepCommentResponse {
    /// Comment id
    pub id: String,

    /// Step number (1-5)
    pub step_number: i32,

    /// Reviewer who wrote the comment
    pub author_id: String,

    /// Comment text
    pub comment: String,

    /// When the comment was recorded (Unix timestamp)
    pub created_at: i64,
}

/// A student on a teacher's roster, with their project when one exists
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct StudentSummary {
    /// Student id
    pub id: String,

    /// Login email
    pub email: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// The student's project
    pub project: Option<ProjectResponse>,
}
