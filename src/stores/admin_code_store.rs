use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set};

use crate::services::crypto;
use crate::types::db::admin_code::{self, ActiveModel, Entity as AdminCode};

/// AdminCodeStore manages the singleton row holding the teacher-signup
/// access code and the active UI theme name.
pub struct AdminCodeStore;

const SINGLETON_ID: i32 = 1;

impl AdminCodeStore {
    pub fn new() -> Self {
        Self
    }

    /// Ensure the singleton row exists, generating an initial access code on
    /// first use.
    async fn ensure_exists(&self, conn: &impl ConnectionTrait) -> Result<(), DbErr> {
        let existing = AdminCode::find_by_id(SINGLETON_ID).one(conn).await?;

        if existing.is_none() {
            let row = ActiveModel {
                id: Set(SINGLETON_ID),
                access_code: Set(crypto::generate_access_code()),
                theme: Set("default".to_string()),
                updated_at: Set(Utc::now().timestamp()),
            };
            row.insert(conn).await?;
        }

        Ok(())
    }

    pub async fn get(&self, conn: &impl ConnectionTrait) -> Result<admin_code::Model, DbErr> {
        self.ensure_exists(conn).await?;

        AdminCode::find_by_id(SINGLETON_ID)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("admin_code row missing".to_string()))
    }

    /// Compare a candidate signup code against the current one.
    pub async fn validate_access_code(
        &self,
        conn: &impl ConnectionTrait,
        candidate: &str,
    ) -> Result<bool, DbErr> {
        let row = self.get(conn).await?;
        Ok(row.access_code == candidate)
    }

    pub async fn set_access_code(
        &self,
        conn: &impl ConnectionTrait,
        access_code: &str,
    ) -> Result<(), DbErr> {
        let row = self.get(conn).await?;

        let mut active: ActiveModel = row.into();
        active.access_code = Set(access_code.to_string());
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    pub async fn set_theme(&self, conn: &impl ConnectionTrait, theme: &str) -> Result<(), DbErr> {
        let row = self.get(conn).await?;

        let mut active: ActiveModel = row.into();
        active.theme = Set(theme.to_string());
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }
}

impl Default for AdminCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};

    async fn setup_test_db() -> (DatabaseConnection, AdminCodeStore) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        (db, AdminCodeStore::new())
    }

    #[tokio::test]
    async fn test_get_creates_singleton_with_generated_code() {
        let (db, store) = setup_test_db().await;

        let row = store.get(&db).await.unwrap();

        assert_eq!(row.id, 1);
        assert!(!row.access_code.is_empty());
        assert_eq!(row.theme, "default");
    }

    #[tokio::test]
    async fn test_get_is_stable_across_calls() {
        let (db, store) = setup_test_db().await;

        let first = store.get(&db).await.unwrap();
        let second = store.get(&db).await.unwrap();

        assert_eq!(first.access_code, second.access_code);
    }

    #[tokio::test]
    async fn test_validate_access_code() {
        let (db, store) = setup_test_db().await;

        store.set_access_code(&db, "FALL2026").await.unwrap();

        assert!(store.validate_access_code(&db, "FALL2026").await.unwrap());
        assert!(!store.validate_access_code(&db, "WRONG").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_theme_persists() {
        let (db, store) = setup_test_db().await;

        store.set_theme(&db, "dark").await.unwrap();

        let row = store.get(&db).await.unwrap();
        assert_eq!(row.theme, "dark");
    }
}
