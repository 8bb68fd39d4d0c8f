use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::types::db::project::{self, ActiveModel as ProjectActiveModel, Entity as Project};
use crate::types::db::project_step::{
    self, ActiveModel as StepActiveModel, Entity as ProjectStep, StepStatus,
};
use crate::types::db::step_comment::{
    self, ActiveModel as CommentActiveModel, Entity as StepComment,
};

/// Number of steps in every project.
pub const STEP_COUNT: usize = 5;

/// ProjectStore manages projects, their ordered steps and the append-only
/// step comments.
pub struct ProjectStore;

impl ProjectStore {
    pub fn new() -> Self {
        Self
    }

    /// Create a project with its five steps. Step 1 starts `In Progress`,
    /// the rest `Not Started`.
    pub async fn create_for_student(
        &self,
        conn: &impl ConnectionTrait,
        student_id: &str,
        teacher_id: Option<String>,
        title: &str,
    ) -> Result<project::Model, DbErr> {
        let now = Utc::now().timestamp();
        let project = ProjectActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            student_id: Set(student_id.to_string()),
            teacher_id: Set(teacher_id),
            title: Set(title.to_string()),
            grade: Set(None),
            current_step: Set(1),
            submitted_to_orbilius: Set(false),
            approved_by_orbilius: Set(None),
            orbilius_comments: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let project = project.insert(conn).await?;

        for step_number in 1..=STEP_COUNT as i32 {
            let status = if step_number == 1 {
                StepStatus::InProgress
            } else {
                StepStatus::NotStarted
            };

            let step = StepActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                project_id: Set(project.id.clone()),
                step_number: Set(step_number),
                status: Set(status),
                due_date: Set(None),
                file_path: Set(None),
                youtube_link: Set(None),
                teacher_comments: Set(None),
            };
            step.insert(conn).await?;
        }

        Ok(project)
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<Option<project::Model>, DbErr> {
        Project::find_by_id(id).one(conn).await
    }

    /// A student's project. Newest first if several exist.
    pub async fn find_by_student(
        &self,
        conn: &impl ConnectionTrait,
        student_id: &str,
    ) -> Result<Option<project::Model>, DbErr> {
        Project::find()
            .filter(project::Column::StudentId.eq(student_id))
            .order_by_desc(project::Column::CreatedAt)
            .one(conn)
            .await
    }

    pub async fn find_by_teacher(
        &self,
        conn: &impl ConnectionTrait,
        teacher_id: &str,
    ) -> Result<Vec<project::Model>, DbErr> {
        Project::find()
            .filter(project::Column::TeacherId.eq(teacher_id))
            .all(conn)
            .await
    }

    /// Ids of every project owned by any of the given students.
    pub async fn ids_for_students(
        &self,
        conn: &impl ConnectionTrait,
        student_ids: &[String],
    ) -> Result<Vec<String>, DbErr> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = Project::find()
            .select_only()
            .column(project::Column::Id)
            .filter(project::Column::StudentId.is_in(student_ids.iter().cloned()))
            .into_tuple()
            .all(conn)
            .await?;

        Ok(ids)
    }

    /// Ids of projects directly assigned to a teacher.
    pub async fn ids_owned_by_teacher(
        &self,
        conn: &impl ConnectionTrait,
        teacher_id: &str,
    ) -> Result<Vec<String>, DbErr> {
        let ids: Vec<String> = Project::find()
            .select_only()
            .column(project::Column::Id)
            .filter(project::Column::TeacherId.eq(teacher_id))
            .into_tuple()
            .all(conn)
            .await?;

        Ok(ids)
    }

    /// The project's steps ordered by step number.
    pub async fn steps_of(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
    ) -> Result<Vec<project_step::Model>, DbErr> {
        ProjectStep::find()
            .filter(project_step::Column::ProjectId.eq(project_id))
            .order_by_asc(project_step::Column::StepNumber)
            .all(conn)
            .await
    }

    async fn step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
    ) -> Result<Option<project_step::Model>, DbErr> {
        ProjectStep::find()
            .filter(project_step::Column::ProjectId.eq(project_id))
            .filter(project_step::Column::StepNumber.eq(step_number))
            .one(conn)
            .await
    }

    pub async fn update_title(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        title: &str,
    ) -> Result<(), DbErr> {
        let Some(row) = Project::find_by_id(project_id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "project {} not found",
                project_id
            )));
        };

        let mut active: ProjectActiveModel = row.into();
        active.title = Set(title.to_string());
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_grade(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        grade: Option<String>,
    ) -> Result<(), DbErr> {
        let Some(row) = Project::find_by_id(project_id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "project {} not found",
                project_id
            )));
        };

        let mut active: ProjectActiveModel = row.into();
        active.grade = Set(grade);
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_due_date(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        due_date: Option<i64>,
    ) -> Result<(), DbErr> {
        let Some(step) = self.step(conn, project_id, step_number).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "step {} of project {} not found",
                step_number, project_id
            )));
        };

        let mut active: StepActiveModel = step.into();
        active.due_date = Set(due_date);
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_step_status(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        status: StepStatus,
    ) -> Result<(), DbErr> {
        let Some(step) = self.step(conn, project_id, step_number).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "step {} of project {} not found",
                step_number, project_id
            )));
        };

        let mut active: StepActiveModel = step.into();
        active.status = Set(status);
        active.update(conn).await?;

        Ok(())
    }

    /// Record an upload on the step row: status becomes `Submitted` and the
    /// step mirrors the uploaded file location.
    pub async fn record_submission_on_step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        file_path: &str,
        youtube_link: Option<String>,
    ) -> Result<(), DbErr> {
        let Some(step) = self.step(conn, project_id, step_number).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "step {} of project {} not found",
                step_number, project_id
            )));
        };

        let mut active: StepActiveModel = step.into();
        active.status = Set(StepStatus::Submitted);
        active.file_path = Set(Some(file_path.to_string()));
        active.youtube_link = Set(youtube_link);
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_step_teacher_comments(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        comment: &str,
    ) -> Result<(), DbErr> {
        let Some(step) = self.step(conn, project_id, step_number).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "step {} of project {} not found",
                step_number, project_id
            )));
        };

        let mut active: StepActiveModel = step.into();
        active.teacher_comments = Set(Some(comment.to_string()));
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_current_step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        current_step: i32,
    ) -> Result<(), DbErr> {
        let Some(row) = Project::find_by_id(project_id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "project {} not found",
                project_id
            )));
        };

        let mut active: ProjectActiveModel = row.into();
        active.current_step = Set(current_step);
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_submitted_to_orbilius(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        submitted: bool,
    ) -> Result<(), DbErr> {
        let Some(row) = Project::find_by_id(project_id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "project {} not found",
                project_id
            )));
        };

        let mut active: ProjectActiveModel = row.into();
        active.submitted_to_orbilius = Set(submitted);
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    /// Record the admin certification ruling.
    pub async fn set_certification(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        approved: Option<bool>,
        comments: Option<String>,
    ) -> Result<(), DbErr> {
        let Some(row) = Project::find_by_id(project_id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!(
                "project {} not found",
                project_id
            )));
        };

        let mut active: ProjectActiveModel = row.into();
        active.approved_by_orbilius = Set(approved);
        active.orbilius_comments = Set(comments);
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    /// Projects whose final step was approved and which still await an
    /// admin certification ruling.
    pub async fn certification_queue(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Vec<project::Model>, DbErr> {
        Project::find()
            .filter(project::Column::SubmittedToOrbilius.eq(true))
            .filter(project::Column::ApprovedByOrbilius.is_null())
            .order_by_asc(project::Column::UpdatedAt)
            .all(conn)
            .await
    }

    /// Append a review comment for a step.
    pub async fn add_step_comment(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
        author_id: &str,
        comment: &str,
    ) -> Result<step_comment::Model, DbErr> {
        let row = CommentActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            project_id: Set(project_id.to_string()),
            step_number: Set(step_number),
            author_id: Set(author_id.to_string()),
            comment: Set(comment.to_string()),
            created_at: Set(Utc::now().timestamp()),
        };

        row.insert(conn).await
    }

    pub async fn comments_for_step(
        &self,
        conn: &impl ConnectionTrait,
        project_id: &str,
        step_number: i32,
    ) -> Result<Vec<step_comment::Model>, DbErr> {
        StepComment::find()
            .filter(step_comment::Column::ProjectId.eq(project_id))
            .filter(step_comment::Column::StepNumber.eq(step_number))
            .order_by_asc(step_comment::Column::CreatedAt)
            .all(conn)
            .await
    }

    pub async fn delete_steps_by_project_ids(
        &self,
        conn: &impl ConnectionTrait,
        project_ids: &[String],
    ) -> Result<u64, DbErr> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let result = ProjectStep::delete_many()
            .filter(project_step::Column::ProjectId.is_in(project_ids.iter().cloned()))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn delete_comments_by_project_ids(
        &self,
        conn: &impl ConnectionTrait,
        project_ids: &[String],
    ) -> Result<u64, DbErr> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let result = StepComment::delete_many()
            .filter(step_comment::Column::ProjectId.is_in(project_ids.iter().cloned()))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn delete_projects_by_ids(
        &self,
        conn: &impl ConnectionTrait,
        project_ids: &[String],
    ) -> Result<u64, DbErr> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let result = Project::delete_many()
            .filter(project::Column::Id.is_in(project_ids.iter().cloned()))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};

    async fn setup_test_db() -> (DatabaseConnection, ProjectStore) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        (db, ProjectStore::new())
    }

    #[tokio::test]
    async fn test_create_for_student_creates_five_steps() {
        let (db, store) = setup_test_db().await;

        let project = store
            .create_for_student(&db, "student-1", Some("teacher-1".to_string()), "Robotics")
            .await
            .expect("Failed to create project");

        assert_eq!(project.current_step, 1);
        assert!(!project.submitted_to_orbilius);
        assert_eq!(project.approved_by_orbilius, None);

        let steps = store.steps_of(&db, &project.id).await.unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].step_number, 1);
        assert_eq!(steps[0].status, StepStatus::InProgress);
        for step in &steps[1..] {
            assert_eq!(step.status, StepStatus::NotStarted);
        }
    }

    #[tokio::test]
    async fn test_find_by_student_returns_project() {
        let (db, store) = setup_test_db().await;

        let created = store
            .create_for_student(&db, "student-1", None, "History of Rome")
            .await
            .unwrap();

        let found = store.find_by_student(&db, "student-1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        assert!(store.find_by_student(&db, "student-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_step_status_and_due_date_updates() {
        let (db, store) = setup_test_db().await;

        let project = store
            .create_for_student(&db, "student-1", None, "Chemistry")
            .await
            .unwrap();

        store
            .set_step_status(&db, &project.id, 1, StepStatus::Approved)
            .await
            .unwrap();
        store
            .set_due_date(&db, &project.id, 2, Some(1_900_000_000))
            .await
            .unwrap();

        let steps = store.steps_of(&db, &project.id).await.unwrap();
        assert_eq!(steps[0].status, StepStatus::Approved);
        assert_eq!(steps[1].due_date, Some(1_900_000_000));
    }

    #[tokio::test]
    async fn test_record_submission_on_step_sets_status_and_path() {
        let (db, store) = setup_test_db().await;

        let project = store
            .create_for_student(&db, "student-1", None, "Astronomy")
            .await
            .unwrap();

        store
            .record_submission_on_step(
                &db,
                &project.id,
                1,
                "uploads/research.pdf",
                Some("https://youtu.be/abc".to_string()),
            )
            .await
            .unwrap();

        let steps = store.steps_of(&db, &project.id).await.unwrap();
        assert_eq!(steps[0].status, StepStatus::Submitted);
        assert_eq!(steps[0].file_path.as_deref(), Some("uploads/research.pdf"));
        assert_eq!(steps[0].youtube_link.as_deref(), Some("https://youtu.be/abc"));
    }

    #[tokio::test]
    async fn test_certification_queue_filters_correctly() {
        let (db, store) = setup_test_db().await;

        let pending = store
            .create_for_student(&db, "student-1", None, "Pending")
            .await
            .unwrap();
        let ruled = store
            .create_for_student(&db, "student-2", None, "Ruled")
            .await
            .unwrap();
        let _unsubmitted = store
            .create_for_student(&db, "student-3", None, "Unsubmitted")
            .await
            .unwrap();

        store
            .set_submitted_to_orbilius(&db, &pending.id, true)
            .await
            .unwrap();
        store
            .set_submitted_to_orbilius(&db, &ruled.id, true)
            .await
            .unwrap();
        store
            .set_certification(&db, &ruled.id, Some(true), None)
            .await
            .unwrap();

        let queue = store.certification_queue(&db).await.unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, pending.id);
    }

    #[tokio::test]
    async fn test_step_comments_accumulate_per_step() {
        let (db, store) = setup_test_db().await;

        let project = store
            .create_for_student(&db, "student-1", None, "Writing")
            .await
            .unwrap();

        store
            .add_step_comment(&db, &project.id, 2, "teacher-1", "First pass")
            .await
            .unwrap();
        store
            .add_step_comment(&db, &project.id, 2, "teacher-1", "Second pass")
            .await
            .unwrap();
        store
            .add_step_comment(&db, &project.id, 3, "teacher-1", "Other step")
            .await
            .unwrap();

        let comments = store.comments_for_step(&db, &project.id, 2).await.unwrap();

        assert_eq!(comments.len(), 2);
        let texts: Vec<&str> = comments.iter().map(|c| c.comment.as_str()).collect();
        assert!(texts.contains(&"First pass"));
        assert!(texts.contains(&"Second pass"));
    }

    #[tokio::test]
    async fn test_cascade_helpers_delete_dependents() {
        let (db, store) = setup_test_db().await;

        let project = store
            .create_for_student(&db, "student-1", None, "Doomed")
            .await
            .unwrap();
        store
            .add_step_comment(&db, &project.id, 1, "teacher-1", "Gone soon")
            .await
            .unwrap();

        let ids = vec![project.id.clone()];
        assert_eq!(store.delete_steps_by_project_ids(&db, &ids).await.unwrap(), 5);
        assert_eq!(store.delete_comments_by_project_ids(&db, &ids).await.unwrap(), 1);
        assert_eq!(store.delete_projects_by_ids(&db, &ids).await.unwrap(), 1);

        assert!(store.find_by_id(&db, &project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_for_students_empty_input() {
        let (db, store) = setup_test_db().await;

        let ids = store.ids_for_students(&db, &[]).await.unwrap();

        assert!(ids.is_empty());
    }
}
