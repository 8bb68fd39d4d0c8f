use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::sync::Arc;

use crate::errors::ProjectError;
use crate::stores::{ProjectStore, SubmissionStore};
use crate::types::db::project;
use crate::types::db::project_step::StepStatus;

/// Message recorded when certification is refused without a custom comment.
pub const DEFAULT_REVISION_MESSAGE: &str =
    "Your archival record needs revision before it can be certified.";

const FINAL_STEP: i32 = 5;

/// ReviewService owns the step status transitions: teacher comment/approve
/// and the admin certification ruling over the final step.
///
/// Each operation runs in a single transaction; there are no automatic
/// retries, callers resubmit on failure.
pub struct ReviewService {
    db: DatabaseConnection,
    project_store: Arc<ProjectStore>,
    submission_store: Arc<SubmissionStore>,
}

impl ReviewService {
    pub fn new(
        db: DatabaseConnection,
        project_store: Arc<ProjectStore>,
        submission_store: Arc<SubmissionStore>,
    ) -> Self {
        Self {
            db,
            project_store,
            submission_store,
        }
    }

    fn check_step_number(step_number: i32) -> Result<(), ProjectError> {
        if (1..=FINAL_STEP).contains(&step_number) {
            Ok(())
        } else {
            Err(ProjectError::invalid_request(format!(
                "step number must be between 1 and {}",
                FINAL_STEP
            )))
        }
    }

    async fn load_project(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
    ) -> Result<project::Model, ProjectError> {
        self.project_store
            .find_by_id(conn, project_id)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Database error: {}", e)))?
            .ok_or_else(|| ProjectError::not_found(format!("project {} not found", project_id)))
    }

    /// Attach a comment everywhere the student will see it: the append-only
    /// comment log, the step row, and the latest submission when one exists.
    async fn attach_comment(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        author_id: &str,
        comment: &str,
    ) -> Result<(), ProjectError> {
        self.project_store
            .add_step_comment(conn, project_id, step_number, author_id, comment)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to record comment: {}", e)))?;

        self.project_store
            .set_step_teacher_comments(conn, project_id, step_number, comment)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update step: {}", e)))?;

        let latest = self
            .submission_store
            .latest_for_step(conn, project_id, step_number)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Database error: {}", e)))?;

        if let Some(submission) = latest {
            self.submission_store
                .set_teacher_comments(conn, &submission.id, comment)
                .await
                .map_err(|e| {
                    ProjectError::internal_error(format!("Failed to update submission: {}", e))
                })?;
        }

        Ok(())
    }

    /// Send the step back to the student with a comment, without accepting
    /// the work: the step returns to `In Progress` and the project cursor
    /// moves back to it.
    pub async fn save_comment(
        &self,
        project_id: &str,
        step_number: i32,
        author_id: &str,
        comment: &str,
    ) -> Result<(), ProjectError> {
        Self::check_step_number(step_number)?;
        if comment.trim().is_empty() {
            return Err(ProjectError::invalid_request("comment must not be empty"));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to start transaction: {}", e)))?;

        self.load_project(&txn, project_id).await?;
        self.attach_comment(&txn, project_id, step_number, author_id, comment)
            .await?;

        self.project_store
            .set_step_status(&txn, project_id, step_number, StepStatus::InProgress)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update step: {}", e)))?;
        self.project_store
            .set_current_step(&txn, project_id, step_number)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(project_id, step_number, "step sent back for revision");
        Ok(())
    }

    /// Approve a step. Steps 1-4 unlock the next step and advance the
    /// cursor; approving the final step marks the project as submitted for
    /// certification and leaves the cursor in place.
    pub async fn approve(
        &self,
        project_id: &str,
        step_number: i32,
        author_id: &str,
        comment: Option<&str>,
    ) -> Result<(), ProjectError> {
        Self::check_step_number(step_number)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to start transaction: {}", e)))?;

        self.load_project(&txn, project_id).await?;

        if let Some(comment) = comment.filter(|c| !c.trim().is_empty()) {
            self.attach_comment(&txn, project_id, step_number, author_id, comment)
                .await?;
        }

        self.project_store
            .set_step_status(&txn, project_id, step_number, StepStatus::Approved)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update step: {}", e)))?;

        if step_number < FINAL_STEP {
            self.project_store
                .set_step_status(&txn, project_id, step_number + 1, StepStatus::InProgress)
                .await
                .map_err(|e| ProjectError::internal_error(format!("Failed to update step: {}", e)))?;
            self.project_store
                .set_current_step(&txn, project_id, step_number + 1)
                .await
                .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;
        } else {
            self.project_store
                .set_submitted_to_orbilius(&txn, project_id, true)
                .await
                .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;
        }

        txn.commit()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(project_id, step_number, "step approved");
        Ok(())
    }

    /// Admin certification ruling over the final step. A rejection resets
    /// step 5 for another pass, with the provided comment or a default
    /// revision message.
    pub async fn set_project_approval(
        &self,
        project_id: &str,
        approved: bool,
        author_id: &str,
        comment: Option<&str>,
    ) -> Result<(), ProjectError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to start transaction: {}", e)))?;

        let project = self.load_project(&txn, project_id).await?;
        if !project.submitted_to_orbilius {
            return Err(ProjectError::invalid_request(
                "project has not been submitted for certification",
            ));
        }

        if approved {
            self.project_store
                .set_certification(&txn, project_id, Some(true), comment.map(str::to_string))
                .await
                .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;
        } else {
            let message = comment
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(DEFAULT_REVISION_MESSAGE);

            self.project_store
                .set_certification(&txn, project_id, Some(false), Some(message.to_string()))
                .await
                .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;

            self.revert_final_step(&txn, project_id, author_id, message)
                .await?;
        }

        txn.commit()
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(project_id, approved, "certification ruling recorded");
        Ok(())
    }

    /// Reset step 5 after a certification rejection: back to `In Progress`,
    /// cursor on 5, certification submission withdrawn.
    async fn revert_final_step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        author_id: &str,
        message: &str,
    ) -> Result<(), ProjectError> {
        self.attach_comment(conn, project_id, FINAL_STEP, author_id, message)
            .await?;

        self.project_store
            .set_step_status(conn, project_id, FINAL_STEP, StepStatus::InProgress)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update step: {}", e)))?;
        self.project_store
            .set_current_step(conn, project_id, FINAL_STEP)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;
        self.project_store
            .set_submitted_to_orbilius(conn, project_id, false)
            .await
            .map_err(|e| ProjectError::internal_error(format!("Failed to update project: {}", e)))?;

        Ok(())
    }
}
