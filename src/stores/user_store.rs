use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::types::db::user::{self, ActiveModel, Entity as User, UserRole};

/// UserStore manages the profile collection. A profile row shares its id
/// with the credential record created at signup.
pub struct UserStore;

impl UserStore {
    pub fn new() -> Self {
        Self
    }

    /// Insert a profile row.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_profile(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
        email: &str,
        role: UserRole,
        first_name: &str,
        last_name: &str,
        teacher_id: Option<String>,
    ) -> Result<user::Model, DbErr> {
        let now = Utc::now().timestamp();
        let profile = ActiveModel {
            id: Set(id.to_string()),
            email: Set(email.to_string()),
            role: Set(role),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            teacher_id: Set(teacher_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        profile.insert(conn).await
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        User::find_by_id(id).one(conn).await
    }

    pub async fn find_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
    }

    pub async fn email_exists(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<bool, DbErr> {
        Ok(self.find_by_email(conn, email).await?.is_some())
    }

    /// All students linked to the given teacher.
    pub async fn students_of(
        &self,
        conn: &impl ConnectionTrait,
        teacher_id: &str,
    ) -> Result<Vec<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::TeacherId.eq(teacher_id))
            .filter(user::Column::Role.eq(UserRole::Student))
            .order_by_asc(user::Column::LastName)
            .all(conn)
            .await
    }

    pub async fn teachers(&self, conn: &impl ConnectionTrait) -> Result<Vec<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::Role.eq(UserRole::Teacher))
            .order_by_asc(user::Column::LastName)
            .all(conn)
            .await
    }

    /// Update the mutable profile fields.
    pub async fn update_name(
        &self,
        conn: &impl ConnectionTrait,
        id: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), DbErr> {
        let Some(row) = User::find_by_id(id).one(conn).await? else {
            return Err(DbErr::RecordNotFound(format!("user {} not found", id)));
        };

        let mut active: ActiveModel = row.into();
        active.first_name = Set(first_name.to_string());
        active.last_name = Set(last_name.to_string());
        active.updated_at = Set(Utc::now().timestamp());
        active.update(conn).await?;

        Ok(())
    }

    /// Delete profile rows for a set of user ids. Returns how many went.
    pub async fn delete_by_ids(
        &self,
        conn: &impl ConnectionTrait,
        ids: &[String],
    ) -> Result<u64, DbErr> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = User::delete_many()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
