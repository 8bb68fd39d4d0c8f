use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::api::auth::BearerAuth;
use crate::api::helpers;
use crate::errors::AdminError;
use crate::services::{crypto, ReviewService, TokenService};
use crate::stores::{AdminCodeStore, ProjectStore, UserStore};
use crate::types::dto::admin::{
    AccessCodeResponse, AdminActionResponse, CertificationRequest, ThemeResponse,
    UpdateAccessCodeRequest, UpdateThemeRequest,
};
use crate::types::dto::auth::ProfileResponse;
use crate::types::dto::project::ProjectResponse;
use crate::types::internal::profile::UserProfile;

/// API tags for admin endpoints
#[derive(Tags)]
enum AdminTags {
    /// Admin management endpoints
    Admin,
}

/// Admin API: access-code rotation, theme, teacher listing and the
/// certification gate over completed projects.
pub struct AdminApi {
    db: DatabaseConnection,
    token_service: Arc<TokenService>,
    user_store: Arc<UserStore>,
    project_store: Arc<ProjectStore>,
    admin_code_store: Arc<AdminCodeStore>,
    review_service: Arc<ReviewService>,
}

impl AdminApi {
    pub fn new(
        db: DatabaseConnection,
        token_service: Arc<TokenService>,
        user_store: Arc<UserStore>,
        project_store: Arc<ProjectStore>,
        admin_code_store: Arc<AdminCodeStore>,
        review_service: Arc<ReviewService>,
    ) -> Self {
        Self {
            db,
            token_service,
            user_store,
            project_store,
            admin_code_store,
            review_service,
        }
    }

    fn internal(e: impl std::fmt::Display) -> AdminError {
        AdminError::internal_error(format!("Database error: {}", e))
    }

    async fn require_admin(&self, auth: &BearerAuth) -> Result<UserProfile, AdminError> {
        let profile = helpers::authenticate(
            &self.db,
            &self.token_service,
            &self.user_store,
            &auth.0.token,
        )
        .await?;

        if !profile.is_admin() {
            return Err(AdminError::forbidden());
        }

        Ok(profile)
    }
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// The current teacher-signup access code
    #[oai(path = "/access-code", method = "get", tag = "AdminTags::Admin")]
    async fn get_access_code(
        &self,
        auth: BearerAuth,
    ) -> Result<Json<AccessCodeResponse>, AdminError> {
        self.require_admin(&auth).await?;

        let row = self
            .admin_code_store
            .get(&self.db)
            .await
            .map_err(Self::internal)?;

        Ok(Json(AccessCodeResponse {
            access_code: row.access_code,
        }))
    }

    /// Rotate the teacher-signup access code
    ///
    /// Provide a code to set it, or omit it to generate a new one.
    #[oai(path = "/access-code", method = "put", tag = "AdminTags::Admin")]
    async fn update_access_code(
        &self,
        auth: BearerAuth,
        body: Json<UpdateAccessCodeRequest>,
    ) -> Result<Json<AccessCodeResponse>, AdminError> {
        self.require_admin(&auth).await?;

        let code = match body.access_code.as_deref().map(str::trim) {
            Some("") | None => crypto::generate_access_code(),
            Some(code) => code.to_string(),
        };

        self.admin_code_store
            .set_access_code(&self.db, &code)
            .await
            .map_err(Self::internal)?;

        tracing::info!("teacher signup code rotated");

        Ok(Json(AccessCodeResponse { access_code: code }))
    }

    /// The active UI theme name
    #[oai(path = "/theme", method = "get", tag = "AdminTags::Admin")]
    async fn get_theme(&self, auth: BearerAuth) -> Result<Json<ThemeResponse>, AdminError> {
        self.require_admin(&auth).await?;

        let row = self
            .admin_code_store
            .get(&self.db)
            .await
            .map_err(Self::internal)?;

        Ok(Json(ThemeResponse { theme: row.theme }))
    }

    /// Switch the active UI theme
    #[oai(path = "/theme", method = "put", tag = "AdminTags::Admin")]
    async fn update_theme(
        &self,
        auth: BearerAuth,
        body: Json<UpdateThemeRequest>,
    ) -> Result<Json<ThemeResponse>, AdminError> {
        self.require_admin(&auth).await?;

        let theme = body.theme.trim();
        if theme.is_empty() {
            return Err(AdminError::invalid_request("theme must not be empty"));
        }

        self.admin_code_store
            .set_theme(&self.db, theme)
            .await
            .map_err(Self::internal)?;

        Ok(Json(ThemeResponse {
            theme: theme.to_string(),
        }))
    }

    /// All teacher profiles
    #[oai(path = "/teachers", method = "get", tag = "AdminTags::Admin")]
    async fn teachers(&self, auth: BearerAuth) -> Result<Json<Vec<ProfileResponse>>, AdminError> {
        self.require_admin(&auth).await?;

        let rows = self
            .user_store
            .teachers(&self.db)
            .await
            .map_err(Self::internal)?;

        Ok(Json(rows.into_iter().map(helpers::profile_response).collect()))
    }

    /// Projects awaiting a certification ruling
    #[oai(path = "/certification/queue", method = "get", tag = "AdminTags::Admin")]
    async fn certification_queue(
        &self,
        auth: BearerAuth,
    ) -> Result<Json<Vec<ProjectResponse>>, AdminError> {
        self.require_admin(&auth).await?;

        let projects = self
            .project_store
            .certification_queue(&self.db)
            .await
            .map_err(Self::internal)?;

        let mut responses = Vec::with_capacity(projects.len());
        for project in projects {
            let steps = self
                .project_store
                .steps_of(&self.db, &project.id)
                .await
                .map_err(Self::internal)?;
            responses.push(helpers::project_response(project, &steps));
        }

        Ok(Json(responses))
    }

    /// Record the certification ruling for a project
    ///
    /// Rejection sends step 5 back to the student with the given comments
    /// (or a default revision message).
    #[oai(
        path = "/certification/:project_id",
        method = "post",
        tag = "AdminTags::Admin"
    )]
    async fn certify(
        &self,
        auth: BearerAuth,
        project_id: Path<String>,
        body: Json<CertificationRequest>,
    ) -> Result<Json<AdminActionResponse>, AdminError> {
        let profile = self.require_admin(&auth).await?;

        self.review_service
            .set_project_approval(
                &project_id.0,
                body.approved,
                &profile.id,
                body.comments.as_deref(),
            )
            .await?;

        let message = if body.approved {
            "Project certified"
        } else {
            "Certification declined; step 5 returned to the student"
        };

        Ok(Json(AdminActionResponse {
            message: message.to_string(),
        }))
    }
}
