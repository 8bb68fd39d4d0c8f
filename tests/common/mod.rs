// Common test utilities for integration tests

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use orbilius_backend::stores::{CredentialStore, ProjectStore, SubmissionStore, UserStore};
use orbilius_backend::types::db::user::UserRole;

pub const TEST_PEPPER: &str = "integration-test-pepper";

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub struct Stores {
    pub credential_store: Arc<CredentialStore>,
    pub user_store: Arc<UserStore>,
    pub project_store: Arc<ProjectStore>,
    pub submission_store: Arc<SubmissionStore>,
}

pub fn stores() -> Stores {
    Stores {
        credential_store: Arc::new(CredentialStore::new(TEST_PEPPER.to_string())),
        user_store: Arc::new(UserStore::new()),
        project_store: Arc::new(ProjectStore::new()),
        submission_store: Arc::new(SubmissionStore::new()),
    }
}

impl Stores {
    /// Create a credentialed account with a profile, returning the user id.
    pub async fn add_user(
        &self,
        db: &DatabaseConnection,
        email: &str,
        role: UserRole,
        teacher_id: Option<&str>,
    ) -> String {
        let id = self
            .credential_store
            .add_account(db, email, "integration-password")
            .await
            .expect("Failed to add account");

        self.user_store
            .create_profile(
                db,
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

    /// A teacher with a freshly signed-up student and their project.
    /// Returns (teacher_id, student_id, project_id).
    pub async fn teacher_with_student(
        &self,
        db: &DatabaseConnection,
        teacher_email: &str,
        student_email: &str,
    ) -> (String, String, String) {
        let teacher_id = self.add_user(db, teacher_email, UserRole::Teacher, None).await;
        let student_id = self
            .add_user(db, student_email, UserRole::Student, Some(&teacher_id))
            .await;

        let project = self
            .project_store
            .create_for_student(db, &student_id, Some(teacher_id.clone()), "Senior Project")
            .await
            .expect("Failed to create project");

        (teacher_id, student_id, project.id)
    }
}
