use sea_orm::entity::prelude::*;

/// Senior project record. Per-step state lives in the ordered
/// `project_steps` rows; this row tracks the cursor and the final
/// certification flags.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub student_id: String,
    #[sea_orm(indexed)]
    pub teacher_id: Option<String>,
    pub title: String,
    pub grade: Option<String>,
    pub current_step: i32,
    pub submitted_to_orbilius: bool,
    /// None until an admin has ruled on certification.
    pub approved_by_orbilius: Option<bool>,
    pub orbilius_comments: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_step::Entity")]
    ProjectSteps,
    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::step_comment::Entity")]
    StepComments,
}

impl Related<super::project_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectSteps.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::step_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StepComments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
