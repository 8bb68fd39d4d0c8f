use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::StudentId).string().not_null())
                    .col(ColumnDef::new(Projects::TeacherId).string())
                    .col(ColumnDef::new(Projects::Title).string().not_null())
                    .col(ColumnDef::new(Projects::Grade).string())
                    .col(
                        ColumnDef::new(Projects::CurrentStep)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Projects::SubmittedToOrbilius)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Projects::ApprovedByOrbilius).boolean())
                    .col(ColumnDef::new(Projects::OrbiliusComments).text())
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_student")
                    .table(Projects::Table)
                    .col(Projects::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_projects_teacher")
                    .table(Projects::Table)
                    .col(Projects::TeacherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectSteps::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProjectSteps::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(ProjectSteps::StepNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectSteps::Status).string().not_null())
                    .col(ColumnDef::new(ProjectSteps::DueDate).big_integer())
                    .col(ColumnDef::new(ProjectSteps::FilePath).string())
                    .col(ColumnDef::new(ProjectSteps::YoutubeLink).string())
                    .col(ColumnDef::new(ProjectSteps::TeacherComments).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_steps_project_id")
                            .from(ProjectSteps::Table, ProjectSteps::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (project, step); lookups are always project-scoped.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_project_steps_project_step")
                    .table(ProjectSteps::Table)
                    .col(ProjectSteps::ProjectId)
                    .col(ProjectSteps::StepNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StepComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StepComments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StepComments::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(StepComments::StepNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StepComments::AuthorId).string().not_null())
                    .col(ColumnDef::new(StepComments::Comment).text().not_null())
                    .col(
                        ColumnDef::new(StepComments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_step_comments_project_id")
                            .from(StepComments::Table, StepComments::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_step_comments_project_step")
                    .table(StepComments::Table)
                    .col(StepComments::ProjectId)
                    .col(StepComments::StepNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::StepNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::FileUrl).string().not_null())
                    .col(ColumnDef::new(Submissions::YoutubeLink).string())
                    .col(ColumnDef::new(Submissions::Notes).text())
                    .col(ColumnDef::new(Submissions::TeacherComments).text())
                    .col(
                        ColumnDef::new(Submissions::SubmittedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_project_id")
                            .from(Submissions::Table, Submissions::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Latest-submission queries order by submitted_at within a step.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_project_step_time")
                    .table(Submissions::Table)
                    .col(Submissions::ProjectId)
                    .col(Submissions::StepNumber)
                    .col(Submissions::SubmittedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StepComments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    StudentId,
    TeacherId,
    Title,
    Grade,
    CurrentStep,
    SubmittedToOrbilius,
    ApprovedByOrbilius,
    OrbiliusComments,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProjectSteps {
    Table,
    Id,
    ProjectId,
    StepNumber,
    Status,
    DueDate,
    FilePath,
    YoutubeLink,
    TeacherComments,
}

#[derive(DeriveIden)]
enum StepComments {
    Table,
    Id,
    ProjectId,
    StepNumber,
    AuthorId,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    ProjectId,
    StepNumber,
    FileUrl,
    YoutubeLink,
    Notes,
    TeacherComments,
    SubmittedAt,
}
