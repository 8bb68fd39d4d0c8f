use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::types::db::submission::{self, ActiveModel, Entity as Submission};

/// SubmissionStore manages the append-only upload log.
pub struct SubmissionStore;

impl SubmissionStore {
    pub fn new() -> Self {
        Self
    }

    /// Record an upload event.
    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        file_url: &str,
        youtube_link: Option<String>,
        notes: Option<String>,
    ) -> Result<submission::Model, DbErr> {
        let row = ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            project_id: Set(project_id.to_string()),
            step_number: Set(step_number),
            file_url: Set(file_url.to_string()),
            youtube_link: Set(youtube_link),
            notes: Set(notes),
            teacher_comments: Set(None),
            submitted_at: Set(Utc::now().timestamp()),
        };

        row.insert(conn).await
    }

    /// The most recent submission for a (project, step) pair.
    ///
    /// Ordered by submitted_at descending with id as a tiebreaker so that
    /// two uploads within the same second resolve deterministically.
    pub async fn latest_for_step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
    ) -> Result<Option<submission::Model>, DbErr> {
        Submission::find()
            .filter(submission::Column::ProjectId.eq(project_id))
            .filter(submission::Column::StepNumber.eq(step_number))
            .order_by_desc(submission::Column::SubmittedAt)
            .order_by_desc(submission::Column::Id)
            .one(conn)
            .await
    }

    pub async fn list_for_step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
    ) -> Result<Vec<submission::Model>, DbErr> {
        Submission::find()
            .filter(submission::Column::ProjectId.eq(project_id))
            .filter(submission::Column::StepNumber.eq(step_number))
            .order_by_desc(submission::Column::SubmittedAt)
            .order_by_desc(submission::Column::Id)
            .all(conn)
            .await
    }

    /// Attach a teacher comment to a submission.
    pub async fn set_teacher_comments(
        &self,
        conn: &impl ConnectionTrait,
        submission_id: &str,
        comment: &str,
    ) -> Result<(), DbErr> {
        let Some(row) = Submission::find_by_id(submission_id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "submission {} not found",
                submission_id
            )));
        };

        let mut active: ActiveModel = row.into();
        active.teacher_comments = Set(Some(comment.to_string()));
        active.update(conn).await?;

        Ok(())
    }

    pub async fn delete_by_project_ids(
        &self,
        conn: &impl ConnectionTrait,
        project_ids: &[String],
    ) -> Result<u64, DbErr> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let result = Submission::delete_many()
            .filter(submission::Column::ProjectId.is_in(project_ids.iter().cloned()))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}
