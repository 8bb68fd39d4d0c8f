use poem_openapi::Object;
use serde::{Deserialize, Serialize};

/// One step of a project, annotated with what the gate allows
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct StepResponse {
    /// Step number (1-5)
    pub step_number: i32,

    /// Display title of the step
    pub title: String,

    /// Step status ("Not Started" | "In Progress" | "Submitted" | "Approved")
    pub status: String,

    /// Due date (Unix timestamp)
    pub due_date: Option<i64>,

    /// Location of the most recent upload
    pub file_path: Option<String>,

    /// Optional video link accompanying the upload
    pub youtube_link: Option<String>,

    /// Latest teacher feedback on this step
    pub teacher_comments: Option<String>,

    /// Whether the student may reach this step right now
    pub accessible: bool,

    /// View to render when accessible ("index" | "status")
    pub route: Option<String>,
}

/// A project with its ordered steps
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ProjectResponse {
    /// Project id
    pub id: String,

    /// Owning student id
    pub student_id: String,

    /// Supervising teacher id
    pub teacher_id: Option<String>,

    /// Project title
    pub title: String,

    /// Assigned grade, once given
    pub grade: Option<String>,

    /// Step the student is currently on (1-5)
    pub current_step: i32,

    /// Status of the current step
    pub current_step_status: String,

    /// The furthest step the gate allows right now
    pub highest_accessible_step: i32,

    /// Whether the final step has been approved by the teacher
    pub submitted_to_orbilius: bool,

    /// Admin certification ruling; absent while pending
    pub approved_by_orbilius: Option<bool>,

    /// Admin certification comments
    pub orbilius_comments: Option<String>,

    /// The five steps in order
    pub steps: Vec<StepResponse>,
}

/// Request model for renaming a project
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateTitleRequest {
    /// New project title
    pub title: String,
}

/// Request model for setting a step due date
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateDueDateRequest {
    /// Due date (Unix timestamp); null clears it
    pub due_date: Option<i64>,
}

/// Request model for recording an upload
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateSubmissionRequest {
    /// URL of the uploaded artifact in blob storage
    pub file_url: String,

    /// Optional video link
    pub youtube_link: Option<String>,

    /// Optional notes for the reviewer
    pub notes: Option<String>,
}

/// One recorded upload event
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    /// Submission id
    pub id: String,

    /// Project this submission belongs to
    pub project_id: String,

    /// Step number (1-5)
    pub step_number: i32,

    /// URL of the uploaded artifact
    pub file_url: String,

    /// Optional video link
    pub youtube_link: Option<String>,

    /// Student notes
    pub notes: Option<String>,

    /// Teacher feedback on this submission
    pub teacher_comments: Option<String>,

    /// Upload time (Unix timestamp)
    pub submitted_at: i64,
}
