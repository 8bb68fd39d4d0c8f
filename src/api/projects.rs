use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;

use crate::api::auth::BearerAuth;
use crate::api::helpers;
use crate::errors::ProjectError;
use crate::services::{progression, TokenService};
use crate::stores::{ProjectStore, SubmissionStore, UserStore};
use crate::types::db::project;
use crate::types::dto::project::{
    CreateSubmissionRequest, ProjectResponse, SubmissionResponse, UpdateDueDateRequest,
    UpdateTitleRequest,
};
use crate::types::dto::review::ReviewActionResponse;
use crate::types::internal::profile::UserProfile;

/// API tags for project endpoints
#[derive(Tags)]
enum ProjectTags {
    /// Student project endpoints
    Projects,
}

/// Student-facing project API: the project with its gated steps, owner
/// edits, and upload recording.
pub struct ProjectsApi {
    db: DatabaseConnection,
    token_service: Arc<TokenService>,
    user_store: Arc<UserStore>,
    project_store: Arc<ProjectStore>,
    submission_store: Arc<SubmissionStore>,
}

impl ProjectsApi {
    pub fn new(
        db: DatabaseConnection,
        token_service: Arc<TokenService>,
        user_store: Arc<UserStore>,
        project_store: Arc<ProjectStore>,
        submission_store: Arc<SubmissionStore>,
    ) -> Self {
        Self {
            db,
            token_service,
            user_store,
            project_store,
            submission_store,
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

    async fn load_project(&self, project_id: &str) -> Result<project::Model, ProjectError> {
        self.project_store
            .find_by_id(&self.db, project_id)
            .await
            .map_err(Self::internal)?
            .ok_or_else(|| ProjectError::not_found(format!("project {} not found", project_id)))
    }

    /// Load a project the caller owns as a student.
    async fn load_owned_project(
        &self,
        profile: &UserProfile,
        project_id: &str,
    ) -> Result<project::Model, ProjectError> {
        let project = self.load_project(project_id).await?;

        if project.student_id != profile.id {
            return Err(ProjectError::forbidden("not your project"));
        }

        Ok(project)
    }

    fn check_step_number(step_number: i32) -> Result<(), ProjectError> {
        if (1..=progression::STEP_COUNT as i32).contains(&step_number) {
            Ok(())
        } else {
            Err(ProjectError::invalid_request(format!(
                "step number must be between 1 and {}",
                progression::STEP_COUNT
            )))
        }
    }
}

#[OpenApi(prefix_path = "/projects")]
impl ProjectsApi {
    /// The caller's project with its steps, gate verdicts included
    #[oai(path = "/mine", method = "get", tag = "ProjectTags::Projects")]
    async fn my_project(&self, auth: BearerAuth) -> Result<Json<ProjectResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;

        if !profile.is_student() {
            return Err(ProjectError::forbidden("only students own a project"));
        }

        let project = self
            .project_store
            .find_by_student(&self.db, &profile.id)
            .await
            .map_err(Self::internal)?
            .ok_or_else(|| ProjectError::not_found("no project for this student"))?;

        let steps = self
            .project_store
            .steps_of(&self.db, &project.id)
            .await
            .map_err(Self::internal)?;

        Ok(Json(helpers::project_response(project, &steps)))
    }

    /// Rename the project
    #[oai(path = "/:project_id/title", method = "put", tag = "ProjectTags::Projects")]
    async fn update_title(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        body: Json<UpdateTitleRequest>,
    ) -> Result<Json<ReviewActionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        self.load_owned_project(&profile, &project_id.0).await?;

        let title = body.title.trim();
        if title.is_empty() {
            return Err(ProjectError::invalid_request("title must not be empty"));
        }

        self.project_store
            .update_title(&self.db, &project_id.0, title)
            .await
            .map_err(Self::internal)?;

        Ok(Json(ReviewActionResponse {
            message: "Title updated".to_string(),
        }))
    }

    /// Set or clear a step's due date
    #[oai(
        path = "/:project_id/steps/:step_number/due-date",
        method = "put",
        tag = "ProjectTags::Projects"
    )]
    async fn update_due_date(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
        body: Json<UpdateDueDateRequest>,
    ) -> Result<Json<ReviewActionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        Self::check_step_number(step_number.0)?;

        self.load_owned_project(&profile, &project_id.0).await?;

        self.project_store
            .set_due_date(&self.db, &project_id.0, step_number.0, body.due_date)
            .await
            .map_err(Self::internal)?;

        Ok(Json(ReviewActionResponse {
            message: "Due date updated".to_string(),
        }))
    }

    /// Record an upload for a step
    ///
    /// The artifact itself lives in blob storage; this records the event,
    /// marks the step `Submitted` and mirrors the file location onto it.
    /// Refused when the gate keeps the step locked or it is already
    /// approved.
    #[oai(
        path = "/:project_id/steps/:step_number/submissions",
        method = "post",
        tag = "ProjectTags::Projects"
    )]
    async fn create_submission(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
        body: Json<CreateSubmissionRequest>,
    ) -> Result<Json<SubmissionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        Self::check_step_number(step_number.0)?;

        let project = self.load_owned_project(&profile, &project_id.0).await?;

        if body.file_url.trim().is_empty() {
            return Err(ProjectError::invalid_request("file_url is required"));
        }

        let step_rows = self
            .project_store
            .steps_of(&self.db, &project.id)
            .await
            .map_err(Self::internal)?;
        let states = progression::states_from_rows(&step_rows);

        if !progression::is_step_accessible(&states, step_number.0) {
            return Err(ProjectError::step_locked(
                "previous step has not been approved",
            ));
        }
        if !progression::uploads_allowed(&states, step_number.0) {
            return Err(ProjectError::step_locked(
                "this step is approved and no longer accepts uploads",
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to start transaction: {}", e)))?;

        let submission = self
            .submission_store
            .create(
                &txn,
                &project.id,
                step_number.0,
                body.file_url.trim(),
                body.youtube_link.clone(),
                body.notes.clone(),
            )
            .await
            .map_err(Self::internal)?;

        self.project_store
            .record_submission_on_step(
                &txn,
                &project.id,
                step_number.0,
                body.file_url.trim(),
                body.youtube_link.clone(),
            )
            .await
            .map_err(Self::internal)?;

        txn.commit()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(
            project_id = %project.id,
            step_number = step_number.0,
            "submission recorded"
        );

        Ok(Json(helpers::submission_response(submission)))
    }

    /// The latest submission for a step, with any teacher feedback
    #[oai(
        path = "/:project_id/steps/:step_number/submissions/latest",
        method = "get",
        tag = "ProjectTags::Projects"
    )]
    async fn latest_submission(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        step_number: Path<i32>,
    ) -> Result<Json<SubmissionResponse>, ProjectError> {
        let profile = self.caller(&auth).await?;
        Self::check_step_number(step_number.0)?;

        let project = self.load_project(&project_id.0).await?;
        if !helpers::can_view_project(&profile, &project) {
            return Err(ProjectError::forbidden("not your project"));
        }

        let submission = self
            .submission_store
            .latest_for_step(&self.db, &project_id.0, step_number.0)
            .await
            .map_err(Self::internal)?
            .ok_or_else(|| ProjectError::not_found("no submission for this step"))?;

        Ok(Json(helpers::submission_response(submission)))
    }
}
