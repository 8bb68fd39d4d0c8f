use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::api::auth::BearerAuth;
use crate::api::helpers;
use crate::errors::ProjectError;
use crate::services::{ReviewService, TokenService};
use crate::stores::{ProjectStore, SubmissionStore, UserStore};
use crate::types::db::project;
use crate::types::dto::project::SubmissionResponse;
use crate::types::dto::review::{
    ApproveRequest, CommentRequest, GradeRequest, ReviewActionResponse, StepCommentResponse,
    StudentSummary,
};
use crate::types::internal::profile::UserProfile;

/// API tags for review endpoints
#[derive(Tags)]
enum ReviewTags {
    /// Teacher review endpoints
    Review,
}

/// Teacher/admin review API: roster, request-revision comments and step
/// approvals.
pub struct ReviewApi {
    db: DatabaseConnection,
    token_service: Arc<TokenService>,
    user_store: Arc<UserStore>,
    project_store: Arc<ProjectStore>,
    submission_store: Arc<SubmissionStore>,
    review_service: Arc<ReviewService>,
}

impl ReviewApi {
    pub fn new(
        db: DatabaseConnection,
        token_service: Arc<TokenService>,
        user_store: Arc<UserStore>,
        project_store: Arc<ProjectStore>,
        submission_store: Arc<SubmissionStore>,
        review_service: Arc<ReviewService>,
    ) -> Self {
        Self {
            db,
            token_service,
            user_store,
            project_store,
            submission_store,
            review_service,
        }
    }

    fn internal(e: impl std::fmt::Display) -> ProjectError {
        ProjectError::internal_error(format!("Database error: {}", e))
    }

    async fn caller(&self, auth: &BearerAuth) -> Result<UserProfile, ProjectError> {
        Ok(helpers::authenticate(
            &self.db,
            &self.token_service,
            &self.user_store,
            &auth.0.token,
        )
        .await?)
    }

    /// Load a project the caller may review: its supervising teacher or an
    /// admin.
    async fn load_reviewable_project(
        &self,
        profile: &UserProfile,
        project_id: &str,
    ) -> Result<project::Model, ProjectError> {
        let project = self
            .project_store
            .find_by_id(&self.db, project_id)
            .await
            .map_err(Self::internal)?
            .ok_or_else(|| ProjectError::not_found(format!("project {} not found", project_id)))?;

        if profile.is_admin() {
            return Ok(project);
        }
        if profile.is_teacher() && project.teacher_id.as_deref() == Some(profile.id.as_str()) {
            return Ok(project);
        }

        Err(ProjectError::forbidden(
            "only the supervising teacher or an admin may review this project",
        ))
    }
}

#[OpenApi(prefix_path = "/review")]
impl ReviewApi {
    /// The teacher's roster with each student's project
    #[oai(path = "/students", method = "get", tag = "ReviewTags::Review")]
    async fn students(&self, auth: BearerAuth) -> Result<Json<Vec<StudentSummary>>, ProjectError> {
        let profile = self.caller(&auth).await?;

        if !profile.is_teacher() {
            return Err(ProjectError::forbidden("only teachers have a roster"));
        }

        let roster = self
            .user_store
            .students_of(&self.db, &profile.id)
            .await
            .map_err(Self::internal)?;

        let mut summaries = Vec::with_capacity(roster.len());
        for student in roster {
            let project = self
                .project_store
                .find_by_student(&self.db, &student.id)
                .await
                .map_err(Self::internal)?;

            let project = match project {
                Some(p) => {
                    let steps = self
                        .project_store
                        .steps_of(&self.db, &p.id)
                        .await
                        .map_err(Self::internal)?;
                    Some(helpers::project_response(p, &steps))
                }
                None => None,
            };

            summaries.push(StudentSummary {
                id: student.id,
                email: student.email,
                first_name: student.first_name,
                last_name: student.last_name,
                project,
            });
        }

        Ok(Json(summaries))
    }

    /// Send a step back to the student with a comment
    #[oai(
        path = "/projects/:project_id/steps/:step_number/comment",
        method = "post",
        tag = "ReviewTags::Review"
    )]
    async fn save_comment(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
        body: Json<CommentRequest>,
    ) -> Result<Json<ReviewActionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_reviewable_project(&profile, &project_id.0).await?;

        self.review_service
            .save_comment(&project_id.0, step_number.0, &profile.id, &body.comment)
            .await?;

        Ok(Json(ReviewActionResponse {
            message: "Comment saved; step returned to the student".to_string(),
        }))
    }

    /// Approve a step, unlocking the next one (or submitting the project
    /// for certification when it is the final step)
    #[oai(
        path = "/projects/:project_id/steps/:step_number/approve",
        method = "post",
        tag = "ReviewTags::Review"
    )]
    async fn approve(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
        body: Json<ApproveRequest>,
    ) -> Result<Json<ReviewActionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_reviewable_project(&profile, &project_id.0).await?;

        self.review_service
            .approve(
                &project_id.0,
                step_number.0,
                &profile.id,
                body.comment.as_deref(),
            )
            .await?;

        Ok(Json(ReviewActionResponse {
            message: "Step approved".to_string(),
        }))
    }

    /// The latest submission for a step under review
    #[oai(
        path = "/projects/:project_id/steps/:step_number/submissions/latest",
        method = "get",
        tag = "ReviewTags::Review"
    )]
    async fn latest_submission(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
    ) -> Result<Json<SubmissionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_reviewable_project(&profile, &project_id.0).await?;

        let submission = self
            .submission_store
            .latest_for_step(&self.db, &project_id.0, step_number.0)
            .await
            .map_err(Self::internal)?
            .ok_or_else(|| ProjectError::not_found("no submission for this step"))?;

        Ok(Json(helpers::submission_response(submission)))
    }

    /// Full upload history for a step, newest first
    #[oai(
        path = "/projects/:project_id/steps/:step_number/submissions",
        method = "get",
        tag = "ReviewTags::Review"
    )]
    async fn submission_history(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
    ) -> Result<Json<Vec<SubmissionResponse>>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_reviewable_project(&profile, &project_id.0).await?;

        let rows = self
            .submission_store
            .list_for_step(&self.db, &project_id.0, step_number.0)
            .await
            .map_err(Self::internal)?;

        Ok(Json(rows.into_iter().map(helpers::submission_response).collect()))
    }

    /// The comment log for a step, oldest first
    #[oai(
        path = "/projects/:project_id/steps/:step_number/comments",
        method = "get",
        tag = "ReviewTags::Review"
    )]
    async fn step_comments(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
    ) -> Result<Json<Vec<StepCommentResponse>>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_reviewable_project(&profile, &project_id.0).await?;

        let rows = self
            .project_store
            .comments_for_step(&self.db, &project_id.0, step_number.0)
            .await
            .map_err(Self::internal)?;

        Ok(Json(
            rows.into_iter()
                .map(|row| StepCommentResponse {
                    id: row.id,
                    step_number: row.step_number,
                    author_id: row.author_id,
                    comment: row.comment,
                    created_at: row.created_at,
                })
                .collect(),
        ))
    }

    /// Record a grade for the project
    #[oai(
        path = "/projects/:project_id/grade",
        method = "put",
        tag = "ReviewTags::Review"
    )]
    async fn set_grade(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        body: Json<GradeRequest>,
    ) -> Result<Json<ReviewActionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_reviewable_project(&profile, &project_id.0).await?;

        self.project_store
            .set_grade(&self.db, &project_id.0, body.grade.clone())
            .await
            .map_err(Self::internal)?;

        Ok(Json(ReviewActionResponse {
            message: "Grade recorded".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use poem_openapi::auth::Bearer;
    use sea_orm::Database;

    use crate::types::db::project_step::StepStatus;
    use crate::types::db::user::UserRole;

    struct Fixture {
        db: DatabaseConnection,
        api: ReviewApi,
        project_store: Arc<ProjectStore>,
        token_service: Arc<TokenService>,
        project_id: String,
    }

    async fn setup() -> Fixture {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let token_service = Arc::new(TokenService::new(
            "test-secret-key-minimum-32-characters-long".to_string(),
            "test-refresh-secret-minimum-32-chars".to_string(),
        ));
        let user_store = Arc::new(UserStore::new());
        let project_store = Arc::new(ProjectStore::new());
        let submission_store = Arc::new(SubmissionStore::new());
        let review_service = Arc::new(ReviewService::new(
            db.clone(),
            Arc::clone(&project_store),
            Arc::clone(&submission_store),
        ));

        user_store
            .create_profile(&db, "teacher-1", "t1@example.com", UserRole::Teacher, "T", "One", None)
            .await
            .unwrap();
        user_store
            .create_profile(&db, "teacher-2", "t2@example.com", UserRole::Teacher, "T", "Two", None)
            .await
            .unwrap();
        user_store
            .create_profile(&db, "admin-1", "a@example.com", UserRole::Admin, "A", "One", None)
            .await
            .unwrap();
        user_store
            .create_profile(
                &db,
                "student-1",
                "s@example.com",
                UserRole::Student,
                "S",
                "One",
                Some("teacher-1".to_string()),
            )
            .await
            .unwrap();

        let project = project_store
            .create_for_student(&db, "student-1", Some("teacher-1".to_string()), "Kites")
            .await
            .unwrap();

        let api = ReviewApi::new(
            db.clone(),
            Arc::clone(&token_service),
            Arc::clone(&user_store),
            Arc::clone(&project_store),
            Arc::clone(&submission_store),
            review_service,
        );

        Fixture {
            db,
            api,
            project_store,
            token_service,
            project_id: project.id,
        }
    }

    fn bearer(f: &Fixture, user_id: &str, role: &str) -> BearerAuth {
        let token = f.token_service.generate_jwt(user_id, role).unwrap();
        BearerAuth(Bearer { token })
    }

    #[tokio::test]
    async fn test_roster_lists_students_with_projects() {
        let f = setup().await;

        let roster = f.api.students(bearer(&f, "teacher-1", "teacher")).await.unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, "student-1");
        let project = roster[0].project.as_ref().expect("project expected");
        assert_eq!(project.title, "Kites");
    }

    #[tokio::test]
    async fn test_roster_forbidden_for_students() {
        let f = setup().await;

        let result = f.api.students(bearer(&f, "student-1", "student")).await;

        assert!(matches!(result, Err(ProjectError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_by_supervising_teacher() {
        let f = setup().await;

        f.api
            .approve(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
                Json(ApproveRequest { comment: None }),
            )
            .await
            .unwrap();

        let steps = f.project_store.steps_of(&f.db, &f.project_id).await.unwrap();
        assert_eq!(steps[0].status, StepStatus::Approved);
        assert_eq!(steps[1].status, StepStatus::InProgress);
    }

    #[tokio::test]
    async fn test_approve_forbidden_for_other_teacher() {
        let f = setup().await;

        let result = f
            .api
            .approve(
                bearer(&f, "teacher-2", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
                Json(ApproveRequest { comment: None }),
            )
            .await;

        assert!(matches!(result, Err(ProjectError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_may_review_any_project() {
        let f = setup().await;

        let result = f
            .api
            .approve(
                bearer(&f, "admin-1", "admin"),
                Path(f.project_id.clone()),
                Path(1),
                Json(ApproveRequest { comment: None }),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_save_comment_resets_step() {
        let f = setup().await;

        f.api
            .save_comment(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
                Json(CommentRequest {
                    comment: "Needs more sources".to_string(),
                }),
            )
            .await
            .unwrap();

        let steps = f.project_store.steps_of(&f.db, &f.project_id).await.unwrap();
        assert_eq!(steps[0].status, StepStatus::InProgress);
        assert_eq!(steps[0].teacher_comments.as_deref(), Some("Needs more sources"));
    }

    #[tokio::test]
    async fn test_step_comments_returns_log_in_order() {
        let f = setup().await;

        f.api
            .save_comment(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
                Json(CommentRequest {
                    comment: "First pass".to_string(),
                }),
            )
            .await
            .unwrap();
        f.api
            .save_comment(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
                Json(CommentRequest {
                    comment: "Second pass".to_string(),
                }),
            )
            .await
            .unwrap();

        let log = f
            .api
            .step_comments(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
            )
            .await
            .unwrap();

        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|c| c.author_id == "teacher-1"));
        let texts: Vec<&str> = log.iter().map(|c| c.comment.as_str()).collect();
        assert!(texts.contains(&"First pass"));
        assert!(texts.contains(&"Second pass"));
    }

    #[tokio::test]
    async fn test_set_grade_records_grade() {
        let f = setup().await;

        f.api
            .set_grade(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Json(GradeRequest {
                    grade: Some("A-".to_string()),
                }),
            )
            .await
            .unwrap();

        let project = f
            .project_store
            .find_by_id(&f.db, &f.project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.grade.as_deref(), Some("A-"));
    }

    #[tokio::test]
    async fn test_submission_history_newest_first() {
        let f = setup().await;

        let submission_store = SubmissionStore::new();
        submission_store
            .create(&f.db, &f.project_id, 1, "uploads/v1.pdf", None, None)
            .await
            .unwrap();
        submission_store
            .create(&f.db, &f.project_id, 1, "uploads/v2.pdf", None, None)
            .await
            .unwrap();

        let history = f
            .api
            .submission_history(
                bearer(&f, "teacher-1", "teacher"),
                Path(f.project_id.clone()),
                Path(1),
            )
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let f = setup().await;

        let result = f
            .api
            .approve(
                bearer(&f, "teacher-1", "teacher"),
                Path("missing".to_string()),
                Path(1),
                Json(ApproveRequest { comment: None }),
            )
            .await;

        assert!(matches!(result, Err(ProjectError::NotFound(_))));
    }
}
