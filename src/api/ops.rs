use poem_openapi::{auth::Bearer, payload::Json, OpenApi, SecurityScheme, Tags};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::errors::OpsError;
use crate::services::{DeletionService, EmailService};
use crate::stores::{CredentialStore, UserStore};
use crate::types::dto::ops::{
    CheckUserEmailRequest, CheckUserEmailResponse, DeleteStudentRequest, DeleteTeacherRequest,
    DeletionReport, SendInviteRequest, SendInviteResponse,
};

/// Service-key bearer authentication for the ops surface
#[derive(SecurityScheme)]
#[oai(ty = "bearer", key_name = "Authorization", key_in = "header")]
pub struct ServiceKeyAuth(pub Bearer);

/// API tags for ops endpoints
#[derive(Tags)]
enum OpsTags {
    /// Service-credentialed operational endpoints
    Ops,
}

/// Operational API behind the service key: email existence checks, the
/// cascading deletions and signup invitations. Never exposed to end users.
pub struct OpsApi {
    db: DatabaseConnection,
    credential_store: Arc<CredentialStore>,
    user_store: Arc<UserStore>,
    deletion_service: Arc<DeletionService>,
    email_service: Option<Arc<EmailService>>,
    service_key: Option<String>,
}

impl OpsApi {
    pub fn new(
        db: DatabaseConnection,
        credential_store: Arc<CredentialStore>,
        user_store: Arc<UserStore>,
        deletion_service: Arc<DeletionService>,
        email_service: Option<Arc<EmailService>>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            db,
            credential_store,
            user_store,
            deletion_service,
            email_service,
            service_key,
        }
    }

    /// Check the caller's service key. A deployment without one configured
    /// is a configuration error, reported before anything else happens.
    fn authorize(&self, auth: &ServiceKeyAuth) -> Result<(), OpsError> {
        let expected = self
            .service_key
            .as_deref()
            .ok_or_else(|| OpsError::config_error("SERVICE_KEY is not configured"))?;

        if auth.0.token != expected {
            return Err(OpsError::unauthorized());
        }

        Ok(())
    }
}

#[OpenApi(prefix_path = "/ops")]
impl OpsApi {
    /// Whether an email is known to the profile collection or the identity
    /// provider
    #[oai(path = "/check-user-email", method = "post", tag = "OpsTags::Ops")]
    async fn check_user_email(
        &self,
        auth: ServiceKeyAuth,
        body: Json<CheckUserEmailRequest>,
    ) -> Result<Json<CheckUserEmailResponse>, OpsError> {
        self.authorize(&auth)?;

        let email = body.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(OpsError::invalid_request("email is required"));
        }

        let in_profiles = self
            .user_store
            .email_exists(&self.db, &email)
            .await
            .map_err(|e| OpsError::internal_error(format!("Database error: {}", e)))?;

        let exists = if in_profiles {
            true
        } else {
            self.credential_store
                .email_exists(&self.db, &email)
                .await
                .map_err(|e| OpsError::internal_error(e.message()))?
        };

        Ok(Json(CheckUserEmailResponse { exists }))
    }

    /// Delete a student and every dependent record
    #[oai(path = "/delete-student", method = "post", tag = "OpsTags::Ops")]
    async fn delete_student(
        &self,
        auth: ServiceKeyAuth,
        body: Json<DeleteStudentRequest>,
    ) -> Result<Json<DeletionReport>, OpsError> {
        self.authorize(&auth)?;

        let student_id = body.student_id.trim();
        if student_id.is_empty() {
            return Err(OpsError::invalid_request("student_id is required"));
        }

        let report = self.deletion_service.delete_student(student_id).await?;
        Ok(Json(report))
    }

    /// Delete a teacher, their students and every dependent record
    #[oai(path = "/delete-teacher", method = "post", tag = "OpsTags::Ops")]
    async fn delete_teacher(
        &self,
        auth: ServiceKeyAuth,
        body: Json<DeleteTeacherRequest>,
    ) -> Result<Json<DeletionReport>, OpsError> {
        self.authorize(&auth)?;

        let teacher_id = body.teacher_id.trim();
        if teacher_id.is_empty() {
            return Err(OpsError::invalid_request("teacher_id is required"));
        }

        let report = self.deletion_service.delete_teacher(teacher_id).await?;
        Ok(Json(report))
    }

    /// Send a signup invitation email
    #[oai(path = "/send-invite", method = "post", tag = "OpsTags::Ops")]
    async fn send_invite(
        &self,
        auth: ServiceKeyAuth,
        body: Json<SendInviteRequest>,
    ) -> Result<Json<SendInviteResponse>, OpsError> {
        self.authorize(&auth)?;

        let email = body.email.trim();
        let role = body.role.trim();
        let signup_url = body.signup_url.trim();

        if email.is_empty() {
            return Err(OpsError::invalid_request("email is required"));
        }
        if !matches!(role, "student" | "teacher") {
            return Err(OpsError::invalid_request("role must be student or teacher"));
        }
        if signup_url.is_empty() {
            return Err(OpsError::invalid_request("signup_url is required"));
        }

        let email_service = self
            .email_service
            .as_ref()
            .ok_or_else(|| OpsError::config_error("email delivery is not configured"))?;

        email_service
            .send_invite(email, role, signup_url)
            .await
            .map_err(|e| OpsError::internal_error(e.to_string()))?;

        Ok(Json(SendInviteResponse { success: true }))
    }
}
