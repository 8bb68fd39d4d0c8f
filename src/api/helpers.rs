use sea_orm::ConnectionTrait;

use crate::errors::AuthError;
use crate::services::progression::{self, STEP_COUNT, STEP_TITLES};
use crate::services::TokenService;
use crate::stores::UserStore;
use crate::types::db::{project, project_step, submission, user};
use crate::types::dto::auth::ProfileResponse;
use crate::types::dto::project::{ProjectResponse, StepResponse, SubmissionResponse};
use crate::types::internal::profile::UserProfile;

/// Resolve a bearer token to a validated profile.
///
/// The JWT proves identity; the profile row is loaded fresh so role changes
/// and deletions take effect immediately.
pub(crate) async fn authenticate(
    conn: &impl ConnectionTrait,
    token_service: &TokenService,
    user_store: &UserStore,
    token: &str,
) -> Result<UserProfile, AuthError> {
    let claims = token_service.validate_jwt(token)?;

    let row = user_store
        .find_by_id(conn, &claims.sub)
        .await
        .map_err(|e| AuthError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(AuthError::invalid_token)?;

    UserProfile::try_from(row)
        .map_err(|e| AuthError::internal_error(format!("Invalid profile record: {}", e)))
}

pub(crate) fn profile_response(row: user::Model) -> ProfileResponse {
    ProfileResponse {
        id: row.id,
        email: row.email,
        first_name: row.first_name,
        last_name: row.last_name,
        role: row.role.as_str().to_string(),
        teacher_id: row.teacher_id,
    }
}

/// Assemble a project response: steps in order, each annotated with the
/// gate's verdict, plus the derived current-step status.
pub(crate) fn project_response(
    project: project::Model,
    step_rows: &[project_step::Model],
) -> ProjectResponse {
    let states = progression::states_from_rows(step_rows);

    let steps = (1..=STEP_COUNT as i32)
        .map(|n| {
            let row = step_rows.iter().find(|r| r.step_number == n);
            let state = &states[(n - 1) as usize];

            StepResponse {
                step_number: n,
                title: STEP_TITLES[(n - 1) as usize].to_string(),
                status: state.status.as_str().to_string(),
                due_date: state.due_date,
                file_path: row.and_then(|r| r.file_path.clone()),
                youtube_link: row.and_then(|r| r.youtube_link.clone()),
                teacher_comments: row.and_then(|r| r.teacher_comments.clone()),
                accessible: progression::is_step_accessible(&states, n),
                route: progression::step_route(&states, n).map(|r| r.as_str().to_string()),
            }
        })
        .collect();

    let current_index = (project.current_step.clamp(1, STEP_COUNT as i32) - 1) as usize;
    let current_step_status = states[current_index].status.as_str().to_string();

    ProjectResponse {
        id: project.id,
        student_id: project.student_id,
        teacher_id: project.teacher_id,
        title: project.title,
        grade: project.grade,
        current_step: project.current_step,
        current_step_status,
        highest_accessible_step: progression::highest_accessible_step(&states),
        submitted_to_orbilius: project.submitted_to_orbilius,
        approved_by_orbilius: project.approved_by_orbilius,
        orbilius_comments: project.orbilius_comments,
        steps,
    }
}

pub(crate) fn submission_response(row: submission::Model) -> SubmissionResponse {
    SubmissionResponse {
        id: row.id,
        project_id: row.project_id,
        step_number: row.step_number,
        file_url: row.file_url,
        youtube_link: row.youtube_link,
        notes: row.notes,
        teacher_comments: row.teacher_comments,
        submitted_at: row.submitted_at,
    }
}

/// Whether a profile may look at a project: its owning student, its
/// supervising teacher, or any admin.
pub(crate) fn can_view_project(profile: &UserProfile, project: &project::Model) -> bool {
    if profile.is_admin() {
        return true;
    }
    if profile.is_teacher() {
        return project.teacher_id.as_deref() == Some(profile.id.as_str());
    }
    project.student_id == profile.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::db::project_step::StepStatus;
    use crate::types::internal::profile::Role;

    fn project_model(student_id: &str, teacher_id: Option<&str>) -> project::Model {
        project::Model {
            id: "project-1".to_string(),
            student_id: student_id.to_string(),
            teacher_id: teacher_id.map(str::to_string),
            title: "Test".to_string(),
            grade: None,
            current_step: 2,
            submitted_to_orbilius: false,
            approved_by_orbilius: None,
            orbilius_comments: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn step_row(step_number: i32, status: StepStatus) -> project_step::Model {
        project_step::Model {
            id: format!("step-{}", step_number),
            project_id: "project-1".to_string(),
            step_number,
            status,
            due_date: None,
            file_path: None,
            youtube_link: None,
            teacher_comments: None,
        }
    }

    fn profile(id: &str, role: Role) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role,
        }
    }

    #[test]
    fn test_project_response_derives_current_step_status() {
        let rows = vec![
            step_row(1, StepStatus::Approved),
            step_row(2, StepStatus::Submitted),
            step_row(3, StepStatus::NotStarted),
            step_row(4, StepStatus::NotStarted),
            step_row(5, StepStatus::NotStarted),
        ];

        let response = project_response(project_model("student-1", None), &rows);

        assert_eq!(response.current_step_status, "Submitted");
        assert_eq!(response.highest_accessible_step, 2);
        assert_eq!(response.steps.len(), 5);
        assert!(response.steps[0].accessible);
        assert!(response.steps[1].accessible);
        assert!(!response.steps[2].accessible);
        assert!(!response.steps[3].accessible);
        assert_eq!(response.steps[1].route.as_deref(), Some("status"));
        assert_eq!(response.steps[2].route, None);
        assert_eq!(response.steps[3].route, None);
        assert_eq!(response.steps[0].title, "Research");
        assert_eq!(response.steps[4].title, "Archival Record");
    }

    #[test]
    fn test_can_view_project_matrix() {
        let project = project_model("student-1", Some("teacher-1"));

        let owner = profile(
            "student-1",
            Role::Student {
                teacher_id: "teacher-1".to_string(),
            },
        );
        let other_student = profile(
            "student-2",
            Role::Student {
                teacher_id: "teacher-1".to_string(),
            },
        );
        let supervising = profile("teacher-1", Role::Teacher);
        let other_teacher = profile("teacher-2", Role::Teacher);
        let admin = profile("admin-1", Role::Admin);

        assert!(can_view_project(&owner, &project));
        assert!(!can_view_project(&other_student, &project));
        assert!(can_view_project(&supervising, &project));
        assert!(!can_view_project(&other_teacher, &project));
        assert!(can_view_project(&admin, &project));
    }
}
