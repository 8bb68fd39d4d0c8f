use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::sync::Arc;

use crate::errors::OpsError;
use crate::stores::{CredentialStore, ProjectStore, SubmissionStore, UserStore};
use crate::types::db::user::UserRole;
use crate::types::dto::ops::{AuthDeletionOutcome, DeletionReport};

/// DeletionService removes a student or teacher together with every record
/// that depends on them: projects, steps, comments, submissions and profile
/// rows, all in one transaction.
///
/// Identity (credential) records are deleted only after that transaction
/// commits, best effort: the data store is the source of truth, so a failed
/// credential deletion is reported per id but never fails the call and is
/// never rolled back.
pub struct DeletionService {
    db: DatabaseConnection,
    credential_store: Arc<CredentialStore>,
    user_store: Arc<UserStore>,
    project_store: Arc<ProjectStore>,
    submission_store: Arc<SubmissionStore>,
}

impl DeletionService {
    pub fn new(
        db: DatabaseConnection,
        credential_store: Arc<CredentialStore>,
        user_store: Arc<UserStore>,
        project_store: Arc<ProjectStore>,
        submission_store: Arc<SubmissionStore>,
    ) -> Self {
        Self {
            db,
            credential_store,
            user_store,
            project_store,
            submission_store,
        }
    }

    fn db_error(e: impl std::fmt::Display) -> OpsError {
        OpsError::internal_error(format!("Database error: {}", e))
    }

    /// Delete every row that references the given projects, then the
    /// projects themselves and the listed profile rows. Runs on the caller's
    /// transaction.
    async fn delete_project_tree(
        &self,
        conn: &impl ConnectionTrait,
        project_ids: &[String],
        profile_ids: &[String],
    ) -> Result<(), OpsError> {
        self.submission_store
            .delete_by_project_ids(conn, project_ids)
            .await
            .map_err(Self::db_error)?;
        self.project_store
            .delete_comments_by_project_ids(conn, project_ids)
            .await
            .map_err(Self::db_error)?;
        self.project_store
            .delete_steps_by_project_ids(conn, project_ids)
            .await
            .map_err(Self::db_error)?;
        self.project_store
            .delete_projects_by_ids(conn, project_ids)
            .await
            .map_err(Self::db_error)?;
        self.user_store
            .delete_by_ids(conn, profile_ids)
            .await
            .map_err(Self::db_error)?;

        Ok(())
    }

    /// Best-effort identity deletion, after the data-store batch committed.
    async fn delete_credential(&self, user_id: &str) -> AuthDeletionOutcome {
        match self.credential_store.delete_account(&self.db, user_id).await {
            Ok(true) => AuthDeletionOutcome {
                user_id: user_id.to_string(),
                deleted: true,
                error: None,
            },
            Ok(false) => AuthDeletionOutcome {
                user_id: user_id.to_string(),
                deleted: false,
                error: Some("no identity record found".to_string()),
            },
            Err(e) => {
                // Accepted inconsistency: the account can still authenticate
                // but its data is gone. Reported, not retried.
                tracing::warn!(user_id, error = %e, "identity deletion failed after cascade");
                AuthDeletionOutcome {
                    user_id: user_id.to_string(),
                    deleted: false,
                    error: Some(e.message()),
                }
            }
        }
    }

    /// Delete a student and everything that depends on them.
    ///
    /// A student with zero projects still succeeds; the cascade just has
    /// nothing to collect.
    pub async fn delete_student(&self, student_id: &str) -> Result<DeletionReport, OpsError> {
        let profile = self
            .user_store
            .find_by_id(&self.db, student_id)
            .await
            .map_err(Self::db_error)?
            .ok_or_else(|| OpsError::not_found(format!("student {} not found", student_id)))?;

        if profile.role != UserRole::Student {
            return Err(OpsError::invalid_request(format!(
                "{} is not a student account",
                student_id
            )));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| OpsError::internal_error(format!("Failed to start transaction: {}", e)))?;

        let student_ids = vec![student_id.to_string()];
        let project_ids = self
            .project_store
            .ids_for_students(&txn, &student_ids)
            .await
            .map_err(Self::db_error)?;

        self.delete_project_tree(&txn, &project_ids, &student_ids)
            .await?;

        txn.commit()
            .await
            .map_err(|e| OpsError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        let auth_outcome = self.delete_credential(student_id).await;

        tracing::info!(
            student_id,
            projects = project_ids.len(),
            "student cascade deleted"
        );

        Ok(DeletionReport {
            success: true,
            message: format!(
                "Deleted student {} and {} project(s)",
                student_id,
                project_ids.len()
            ),
            auth_results: vec![auth_outcome],
        })
    }

    /// Delete a teacher, every student assigned to them (full student
    /// cascade each), and any projects directly owned by the teacher.
    pub async fn delete_teacher(&self, teacher_id: &str) -> Result<DeletionReport, OpsError> {
        let profile = self
            .user_store
            .find_by_id(&self.db, teacher_id)
            .await
            .map_err(Self::db_error)?
            .ok_or_else(|| OpsError::not_found(format!("teacher {} not found", teacher_id)))?;

        if profile.role != UserRole::Teacher {
            return Err(OpsError::invalid_request(format!(
                "{} is not a teacher account",
                teacher_id
            )));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| OpsError::internal_error(format!("Failed to start transaction: {}", e)))?;

        let student_ids: Vec<String> = self
            .user_store
            .students_of(&txn, teacher_id)
            .await
            .map_err(Self::db_error)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let mut project_ids = self
            .project_store
            .ids_for_students(&txn, &student_ids)
            .await
            .map_err(Self::db_error)?;

        // Projects assigned directly to the teacher, with or without a
        // student link.
        for id in self
            .project_store
            .ids_owned_by_teacher(&txn, teacher_id)
            .await
            .map_err(Self::db_error)?
        {
            if !project_ids.contains(&id) {
                project_ids.push(id);
            }
        }

        let mut profile_ids = student_ids.clone();
        profile_ids.push(teacher_id.to_string());

        self.delete_project_tree(&txn, &project_ids, &profile_ids)
            .await?;

        txn.commit()
            .await
            .map_err(|e| OpsError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        // One outcome per affected identity; failures are independent.
        let mut auth_results = Vec::with_capacity(profile_ids.len());
        for id in &profile_ids {
            auth_results.push(self.delete_credential(id).await);
        }

        tracing::info!(
            teacher_id,
            students = student_ids.len(),
            projects = project_ids.len(),
            "teacher cascade deleted"
        );

        Ok(DeletionReport {
            success: true,
            message: format!(
                "Deleted teacher {}, {} student(s) and {} project(s)",
                teacher_id,
                student_ids.len(),
                project_ids.len()
            ),
            auth_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, EntityTrait};

    use crate::types::db::project::Entity as Project;
    use crate::types::db::project_step::Entity as ProjectStep;
    use crate::types::db::step_comment::Entity as StepComment;
    use crate::types::db::submission::Entity as Submission;
    use crate::types::db::user::Entity as User;

    struct Fixture {
        db: DatabaseConnection,
        credential_store: Arc<CredentialStore>,
        user_store: Arc<UserStore>,
        project_store: Arc<ProjectStore>,
        submission_store: Arc<SubmissionStore>,
        service: DeletionService,
    }

    async fn setup() -> Fixture {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let credential_store = Arc::new(CredentialStore::new("test-pepper".to_string()));
        let user_store = Arc::new(UserStore::new());
        let project_store = Arc::new(ProjectStore::new());
        let submission_store = Arc::new(SubmissionStore::new());

        let service = DeletionService::new(
            db.clone(),
            Arc::clone(&credential_store),
            Arc::clone(&user_store),
            Arc::clone(&project_store),
            Arc::clone(&submission_store),
        );

        Fixture {
            db,
            credential_store,
            user_store,
            project_store,
            submission_store,
            service,
        }
    }

    /// Create a credentialed profile and return its id.
    async fn add_user(f: &Fixture, email: &str, role: UserRole, teacher_id: Option<&str>) -> String {
        let id = f
            .credential_store
            .add_account(&f.db, email, "some-password")
            .await
            .expect("Failed to add account");

        f.user_store
            .create_profile(
                &f.db,
                &id,
                email,
                role,
                "Test",
                "User",
                teacher_id.map(str::to_string),
            )
            .await
            .expect("Failed to create profile");

        id
    }

    /// A student with a project, one submission and one comment.
    async fn add_student_with_project(f: &Fixture, email: &str, teacher_id: &str) -> (String, String) {
        let student_id = add_user(f, email, UserRole::Student, Some(teacher_id)).await;

        let project = f
            .project_store
            .create_for_student(&f.db, &student_id, Some(teacher_id.to_string()), "Project")
            .await
            .unwrap();
        f.submission_store
            .create(&f.db, &project.id, 1, "uploads/a.pdf", None, None)
            .await
            .unwrap();
        f.project_store
            .add_step_comment(&f.db, &project.id, 1, teacher_id, "Looks fine")
            .await
            .unwrap();

        (student_id, project.id)
    }

    #[tokio::test]
    async fn test_delete_student_removes_all_dependents() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;
        let (student_id, project_id) =
            add_student_with_project(&f, "student@example.com", &teacher_id).await;

        let report = f.service.delete_student(&student_id).await.unwrap();

        assert!(report.success);
        assert_eq!(report.auth_results.len(), 1);
        assert!(report.auth_results[0].deleted);

        // Every dependent record is gone
        assert!(Project::find_by_id(&project_id).one(&f.db).await.unwrap().is_none());
        assert!(ProjectStep::find().all(&f.db).await.unwrap().is_empty());
        assert!(StepComment::find().all(&f.db).await.unwrap().is_empty());
        assert!(Submission::find().all(&f.db).await.unwrap().is_empty());
        assert!(User::find_by_id(&student_id).one(&f.db).await.unwrap().is_none());
        assert!(!f
            .credential_store
            .email_exists(&f.db, "student@example.com")
            .await
            .unwrap());

        // The teacher is untouched
        assert!(User::find_by_id(&teacher_id).one(&f.db).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_student_with_zero_projects_succeeds() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;
        let student_id =
            add_user(&f, "bare@example.com", UserRole::Student, Some(&teacher_id)).await;

        let report = f.service.delete_student(&student_id).await.unwrap();

        assert!(report.success);
        assert!(report.message.contains("0 project(s)"));
        assert!(User::find_by_id(&student_id).one(&f.db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_student_unknown_id_is_not_found() {
        let f = setup().await;

        let result = f.service.delete_student("no-such-student").await;

        assert!(matches!(result, Err(OpsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_student_rejects_non_student_account() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;

        let result = f.service.delete_student(&teacher_id).await;

        assert!(matches!(result, Err(OpsError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_student_reports_missing_identity_without_failing() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;
        let student_id =
            add_user(&f, "ghost@example.com", UserRole::Student, Some(&teacher_id)).await;

        // Identity record vanishes out from under the cascade
        f.credential_store.delete_account(&f.db, &student_id).await.unwrap();

        let report = f.service.delete_student(&student_id).await.unwrap();

        assert!(report.success);
        assert!(!report.auth_results[0].deleted);
        assert!(report.auth_results[0].error.is_some());
    }

    #[tokio::test]
    async fn test_delete_teacher_cascades_to_all_students() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;
        let (student_a, _) = add_student_with_project(&f, "a@example.com", &teacher_id).await;
        let (student_b, _) = add_student_with_project(&f, "b@example.com", &teacher_id).await;

        // A student of someone else survives
        let other_teacher = add_user(&f, "other@example.com", UserRole::Teacher, None).await;
        let (other_student, other_project) =
            add_student_with_project(&f, "c@example.com", &other_teacher).await;

        let report = f.service.delete_teacher(&teacher_id).await.unwrap();

        assert!(report.success);
        // One outcome per affected identity: two students plus the teacher
        assert_eq!(report.auth_results.len(), 3);
        assert!(report.auth_results.iter().all(|o| o.deleted));
        let ids: Vec<&str> = report.auth_results.iter().map(|o| o.user_id.as_str()).collect();
        assert!(ids.contains(&student_a.as_str()));
        assert!(ids.contains(&student_b.as_str()));
        assert!(ids.contains(&teacher_id.as_str()));

        assert!(User::find_by_id(&teacher_id).one(&f.db).await.unwrap().is_none());
        assert!(User::find_by_id(&student_a).one(&f.db).await.unwrap().is_none());
        assert!(User::find_by_id(&student_b).one(&f.db).await.unwrap().is_none());

        // The unrelated teacher's world is intact
        assert!(User::find_by_id(&other_student).one(&f.db).await.unwrap().is_some());
        assert!(Project::find_by_id(&other_project).one(&f.db).await.unwrap().is_some());
        let remaining_steps = ProjectStep::find().all(&f.db).await.unwrap();
        assert_eq!(remaining_steps.len(), 5);
    }

    #[tokio::test]
    async fn test_delete_teacher_includes_directly_owned_projects() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;

        // A project assigned to the teacher whose owner is not one of their
        // students.
        let stray = f
            .project_store
            .create_for_student(&f.db, "external-student", Some(teacher_id.clone()), "Stray")
            .await
            .unwrap();

        let report = f.service.delete_teacher(&teacher_id).await.unwrap();

        assert!(report.success);
        assert!(Project::find_by_id(&stray.id).one(&f.db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_teacher_with_no_students_succeeds() {
        let f = setup().await;

        let teacher_id = add_user(&f, "solo@example.com", UserRole::Teacher, None).await;

        let report = f.service.delete_teacher(&teacher_id).await.unwrap();

        assert!(report.success);
        assert_eq!(report.auth_results.len(), 1);
        assert_eq!(report.auth_results[0].user_id, teacher_id);
    }

    #[tokio::test]
    async fn test_delete_teacher_rejects_student_account() {
        let f = setup().await;

        let teacher_id = add_user(&f, "teacher@example.com", UserRole::Teacher, None).await;
        let student_id =
            add_user(&f, "student@example.com", UserRole::Student, Some(&teacher_id)).await;

        let result = f.service.delete_teacher(&student_id).await;

        assert!(matches!(result, Err(OpsError::InvalidRequest(_))));
    }
}
