use poem_openapi::{auth::Bearer, payload::Json, OpenApi, SecurityScheme, Tags};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;

use crate::api::helpers;
use crate::config::AppSettings;
use crate::errors::AuthError;
use crate::services::{EmailService, TokenService};
use crate::stores::{AdminCodeStore, CredentialStore, ProjectStore, UserStore};
use crate::types::db::user::UserRole;
use crate::types::dto::auth::{
    LoginRequest, LogoutRequest, LogoutResponse, PasswordResetConfirmRequest, PasswordResetRequest,
    ProfileResponse, RefreshRequest, RefreshResponse, SignupRequest, SignupResponse, TokenResponse,
    UpdateProfileRequest,
};
use crate::types::internal::profile::UserProfile;

/// Fallback project title when a student signs up without naming one.
const DEFAULT_PROJECT_TITLE: &str = "Senior Project";

const MIN_PASSWORD_LENGTH: usize = 8;

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

/// Authentication API endpoints
pub struct AuthApi {
    db: DatabaseConnection,
    credential_store: Arc<CredentialStore>,
    user_store: Arc<UserStore>,
    project_store: Arc<ProjectStore>,
    admin_code_store: Arc<AdminCodeStore>,
    token_service: Arc<TokenService>,
    email_service: Option<Arc<EmailService>>,
    public_base_url: String,
}

impl AuthApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: DatabaseConnection,
        credential_store: Arc<CredentialStore>,
        user_store: Arc<UserStore>,
        project_store: Arc<ProjectStore>,
        admin_code_store: Arc<AdminCodeStore>,
        token_service: Arc<TokenService>,
        email_service: Option<Arc<EmailService>>,
        settings: &AppSettings,
    ) -> Self {
        Self {
            db,
            credential_store,
            user_store,
            project_store,
            admin_code_store,
            token_service,
            email_service,
            public_base_url: settings.public_base_url.clone(),
        }
    }

    fn internal(e: impl std::fmt::Display) -> AuthError {
        AuthError::internal_error(format!("Database error: {}", e))
    }

    fn profile_dto(profile: UserProfile) -> ProfileResponse {
        ProfileResponse {
            teacher_id: profile.teacher_id().map(str::to_string),
            role: profile.role.name().to_string(),
            id: profile.id,
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
        }
    }
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Create a student or teacher account
    ///
    /// Students name their supervising teacher and get a project with its
    /// five steps; teachers must present the current signup access code.
    #[oai(path = "/signup", method = "post", tag = "AuthTags::Authentication")]
    async fn signup(&self, body: Json<SignupRequest>) -> Result<Json<SignupResponse>, AuthError> {
        let email = body.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::invalid_request("a valid email is required"));
        }
        if body.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::invalid_request(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if body.first_name.trim().is_empty() || body.last_name.trim().is_empty() {
            return Err(AuthError::invalid_request("first and last name are required"));
        }

        let role = match body.role.as_str() {
            "student" => UserRole::Student,
            "teacher" => UserRole::Teacher,
            // Admin accounts are provisioned by the operator, never over HTTP.
            _ => return Err(AuthError::invalid_request("role must be student or teacher")),
        };

        let teacher_id = match role {
            UserRole::Student => {
                let teacher_id = body
                    .teacher_id
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| AuthError::invalid_request("students must name a teacher"))?;

                let teacher = self
                    .user_store
                    .find_by_id(&self.db, teacher_id)
                    .await
                    .map_err(Self::internal)?
                    .filter(|t| t.role == UserRole::Teacher)
                    .ok_or_else(|| AuthError::invalid_request("unknown teacher"))?;

                Some(teacher.id)
            }
            _ => {
                let code = body
                    .access_code
                    .as_deref()
                    .ok_or_else(AuthError::invalid_access_code)?;

                let valid = self
                    .admin_code_store
                    .validate_access_code(&self.db, code)
                    .await
                    .map_err(Self::internal)?;
                if !valid {
                    return Err(AuthError::invalid_access_code());
                }

                None
            }
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to start transaction: {}", e)))?;

        let user_id = self.credential_store.add_account(&txn, &email, &body.password).await?;

        self.user_store
            .create_profile(
                &txn,
                &user_id,
                &email,
                role,
                body.first_name.trim(),
                body.last_name.trim(),
                teacher_id.clone(),
            )
            .await
            .map_err(Self::internal)?;

        if role == UserRole::Student {
            let title = body
                .project_title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(DEFAULT_PROJECT_TITLE);

            self.project_store
                .create_for_student(&txn, &user_id, teacher_id, title)
                .await
                .map_err(Self::internal)?;
        }

        txn.commit()
            .await
            .map_err(|e| AuthError::internal_error(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(user_id = %user_id, role = role.as_str(), "account created");

        Ok(Json(SignupResponse {
            user_id,
            role: role.as_str().to_string(),
        }))
    }

    /// Login with email and password to receive authentication tokens
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, body: Json<LoginRequest>) -> Result<Json<TokenResponse>, AuthError> {
        let email = body.email.trim().to_lowercase();

        let user_id = self
            .credential_store
            .verify_credentials(&self.db, &email, &body.password)
            .await?;

        // An identity without a profile cannot use the application.
        let profile_row = self
            .user_store
            .find_by_id(&self.db, &user_id)
            .await
            .map_err(Self::internal)?
            .ok_or_else(AuthError::invalid_credentials)?;

        let access_token = self
            .token_service
            .generate_jwt(&user_id, profile_row.role.as_str())?;

        let refresh_token = self.token_service.generate_opaque_token();
        let token_hash = self.token_service.hash_opaque_token(&refresh_token);
        self.credential_store
            .store_refresh_token(
                &self.db,
                token_hash,
                user_id,
                self.token_service.refresh_expiration(),
            )
            .await?;

        Ok(Json(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_expires_in(),
        }))
    }

    /// Refresh access token using a refresh token
    #[oai(path = "/refresh", method = "post", tag = "AuthTags::Authentication")]
    async fn refresh(&self, body: Json<RefreshRequest>) -> Result<Json<RefreshResponse>, AuthError> {
        let token_hash = self.token_service.hash_opaque_token(&body.refresh_token);

        let user_id = self
            .credential_store
            .validate_refresh_token(&self.db, &token_hash)
            .await?;

        let profile_row = self
            .user_store
            .find_by_id(&self.db, &user_id)
            .await
            .map_err(Self::internal)?
            .ok_or_else(AuthError::invalid_refresh_token)?;

        let access_token = self
            .token_service
            .generate_jwt(&user_id, profile_row.role.as_str())?;

        Ok(Json(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_service.access_expires_in(),
        }))
    }

    /// Logout and revoke refresh token
    #[oai(path = "/logout", method = "post", tag = "AuthTags::Authentication")]
    async fn logout(
        &self,
        auth: BearerAuth,
        body: Json<LogoutRequest>,
    ) -> Result<Json<LogoutResponse>, AuthError> {
        self.token_service.validate_jwt(&auth.0.token)?;

        let token_hash = self.token_service.hash_opaque_token(&body.refresh_token);
        // An unknown token still logs the caller out.
        if let Err(e) = self
            .credential_store
            .revoke_refresh_token(&self.db, &token_hash)
            .await
        {
            tracing::debug!(error = %e, "refresh token not revoked at logout");
        }

        Ok(Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }))
    }

    /// Verify JWT and return the caller's profile
    #[oai(path = "/whoami", method = "get", tag = "AuthTags::Authentication")]
    async fn whoami(&self, auth: BearerAuth) -> Result<Json<ProfileResponse>, AuthError> {
        let profile = helpers::authenticate(
            &self.db,
            &self.token_service,
            &self.user_store,
            &auth.0.token,
        )
        .await?;

        Ok(Json(Self::profile_dto(profile)))
    }

    /// Edit the caller's name
    #[oai(path = "/profile", method = "put", tag = "AuthTags::Authentication")]
    async fn update_profile(
        &self,
        auth: BearerAuth,
        body: Json<UpdateProfileRequest>,
    ) -> Result<Json<ProfileResponse>, AuthError> {
        let profile = helpers::authenticate(
            &self.db,
            &self.token_service,
            &self.user_store,
            &auth.0.token,
        )
        .await?;

        let first_name = body.first_name.trim();
        let last_name = body.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(AuthError::invalid_request("first and last name are required"));
        }

        self.user_store
            .update_name(&self.db, &profile.id, first_name, last_name)
            .await
            .map_err(Self::internal)?;

        let row = self
            .user_store
            .find_by_id(&self.db, &profile.id)
            .await
            .map_err(Self::internal)?
            .ok_or_else(AuthError::invalid_token)?;

        Ok(Json(helpers::profile_response(row)))
    }

    /// Start a password reset
    ///
    /// Responds identically whether or not the email is registered.
    #[oai(
        path = "/password-reset/request",
        method = "post",
        tag = "AuthTags::Authentication"
    )]
    async fn request_password_reset(
        &self,
        body: Json<PasswordResetRequest>,
    ) -> Result<Json<LogoutResponse>, AuthError> {
        let email = body.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AuthError::invalid_request("email is required"));
        }

        let reset_token = self.token_service.generate_opaque_token();
        let token_hash = self.token_service.hash_opaque_token(&reset_token);

        let issued_for = self
            .credential_store
            .store_reset_token(
                &self.db,
                &email,
                token_hash,
                self.token_service.reset_expiration(),
            )
            .await?;

        if issued_for.is_some() {
            let reset_url = format!(
                "{}/reset-password?token={}",
                self.public_base_url, reset_token
            );

            match &self.email_service {
                Some(email_service) => {
                    if let Err(e) = email_service.send_password_reset(&email, &reset_url).await {
                        // The token is stored either way; the user can retry.
                        tracing::warn!(error = %e, "failed to send password-reset email");
                    }
                }
                None => {
                    tracing::warn!("password reset requested but email is not configured");
                }
            }
        }

        Ok(Json(LogoutResponse {
            message: "If that email is registered, a reset link is on its way".to_string(),
        }))
    }

    /// Complete a password reset with a token from the email
    #[oai(
        path = "/password-reset/confirm",
        method = "post",
        tag = "AuthTags::Authentication"
    )]
    async fn confirm_password_reset(
        &self,
        body: Json<PasswordResetConfirmRequest>,
    ) -> Result<Json<LogoutResponse>, AuthError> {
        if body.new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::invalid_request(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let token_hash = self.token_service.hash_opaque_token(&body.token);
        let user_id = self
            .credential_store
            .consume_reset_token(&self.db, &token_hash)
            .await?;

        self.credential_store
            .set_password(&self.db, &user_id, &body.new_password)
            .await?;

        tracing::info!(user_id = %user_id, "password reset completed");

        Ok(Json(LogoutResponse {
            message: "Password updated".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> (DatabaseConnection, AuthApi) {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let settings = test_settings();
        let api = AuthApi::new(
            db.clone(),
            Arc::new(CredentialStore::new("test-pepper-for-api-tests".to_string())),
            Arc::new(UserStore::new()),
            Arc::new(ProjectStore::new()),
            Arc::new(AdminCodeStore::new()),
            Arc::new(TokenService::new(
                "test-secret-key-minimum-32-characters-long".to_string(),
                "test-refresh-secret-minimum-32-chars".to_string(),
            )),
            None,
            &settings,
        );

        (db, api)
    }

    fn test_settings() -> AppSettings {
        AppSettings {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            jwt_secret: "test-secret-key-minimum-32-characters-long".to_string(),
            refresh_token_secret: "test-refresh-secret-minimum-32-chars".to_string(),
            password_pepper: "test-pepper-for-api-tests".to_string(),
            service_key: None,
            email: None,
            bootstrap_admin: None,
        }
    }

    fn teacher_signup(email: &str, code: &str) -> Json<SignupRequest> {
        Json(SignupRequest {
            email: email.to_string(),
            password: "teacher-password".to_string(),
            first_name: "Tess".to_string(),
            last_name: "Cher".to_string(),
            role: "teacher".to_string(),
            teacher_id: None,
            access_code: Some(code.to_string()),
            project_title: None,
        })
    }

    fn student_signup(email: &str, teacher_id: &str) -> Json<SignupRequest> {
        Json(SignupRequest {
            email: email.to_string(),
            password: "student-password".to_string(),
            first_name: "Stu".to_string(),
            last_name: "Dent".to_string(),
            role: "student".to_string(),
            teacher_id: Some(teacher_id.to_string()),
            access_code: None,
            project_title: None,
        })
    }

    async fn access_code(db: &DatabaseConnection) -> String {
        AdminCodeStore::new().get(db).await.unwrap().access_code
    }

    #[tokio::test]
    async fn test_teacher_signup_with_valid_code() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        let result = api.signup(teacher_signup("t@example.com", &code)).await;

        assert!(result.is_ok());
        let response = result.unwrap();
        assert_eq!(response.role, "teacher");
    }

    #[tokio::test]
    async fn test_teacher_signup_with_wrong_code_writes_nothing() {
        let (db, api) = setup().await;
        let _ = access_code(&db).await;

        let result = api.signup(teacher_signup("t@example.com", "WRONGCODE")).await;

        assert!(matches!(result, Err(AuthError::InvalidAccessCode(_))));
        assert!(!UserStore::new().email_exists(&db, "t@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_student_signup_creates_project_with_five_steps() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        let teacher = api.signup(teacher_signup("t@example.com", &code)).await.unwrap();
        let student = api
            .signup(student_signup("s@example.com", &teacher.user_id))
            .await
            .unwrap();

        let project_store = ProjectStore::new();
        let project = project_store
            .find_by_student(&db, &student.user_id)
            .await
            .unwrap()
            .expect("student should have a project");
        assert_eq!(project.title, DEFAULT_PROJECT_TITLE);
        assert_eq!(project.teacher_id.as_deref(), Some(teacher.user_id.as_str()));

        let steps = project_store.steps_of(&db, &project.id).await.unwrap();
        assert_eq!(steps.len(), 5);
    }

    #[tokio::test]
    async fn test_student_signup_requires_known_teacher() {
        let (_db, api) = setup().await;

        let result = api.signup(student_signup("s@example.com", "missing-teacher")).await;

        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_signup_fails() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("dup@example.com", &code)).await.unwrap();
        let result = api.signup(teacher_signup("dup@example.com", &code)).await;

        assert!(matches!(result, Err(AuthError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_admin_role_cannot_be_requested() {
        let (_db, api) = setup().await;

        let mut request = teacher_signup("a@example.com", "whatever");
        request.0.role = "admin".to_string();

        let result = api.signup(request).await;

        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_login_returns_tokens_with_role_claim() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("t@example.com", &code)).await.unwrap();

        let result = api
            .login(Json(LoginRequest {
                email: "t@example.com".to_string(),
                password: "teacher-password".to_string(),
            }))
            .await;

        assert!(result.is_ok());
        let response = result.unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);

        let token_service = TokenService::new(
            "test-secret-key-minimum-32-characters-long".to_string(),
            "test-refresh-secret-minimum-32-chars".to_string(),
        );
        let claims = token_service.validate_jwt(&response.access_token).unwrap();
        assert_eq!(claims.role, "teacher");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("t@example.com", &code)).await.unwrap();

        let result = api
            .login(Json(LoginRequest {
                email: "t@example.com".to_string(),
                password: "not-the-password".to_string(),
            }))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("t@example.com", &code)).await.unwrap();
        let login = api
            .login(Json(LoginRequest {
                email: "t@example.com".to_string(),
                password: "teacher-password".to_string(),
            }))
            .await
            .unwrap();

        let result = api
            .refresh(Json(RefreshRequest {
                refresh_token: login.refresh_token.clone(),
            }))
            .await;

        assert!(result.is_ok());
        assert!(!result.unwrap().access_token.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_fails_after_logout() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("t@example.com", &code)).await.unwrap();
        let login = api
            .login(Json(LoginRequest {
                email: "t@example.com".to_string(),
                password: "teacher-password".to_string(),
            }))
            .await
            .unwrap();

        let auth = BearerAuth(Bearer {
            token: login.access_token.clone(),
        });
        api.logout(
            auth,
            Json(LogoutRequest {
                refresh_token: login.refresh_token.clone(),
            }),
        )
        .await
        .unwrap();

        let result = api
            .refresh(Json(RefreshRequest {
                refresh_token: login.refresh_token.clone(),
            }))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidRefreshToken(_))));
    }

    #[tokio::test]
    async fn test_whoami_returns_profile() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("t@example.com", &code)).await.unwrap();
        let login = api
            .login(Json(LoginRequest {
                email: "t@example.com".to_string(),
                password: "teacher-password".to_string(),
            }))
            .await
            .unwrap();

        let auth = BearerAuth(Bearer {
            token: login.access_token.clone(),
        });
        let result = api.whoami(auth).await;

        assert!(result.is_ok());
        let profile = result.unwrap();
        assert_eq!(profile.email, "t@example.com");
        assert_eq!(profile.role, "teacher");
        assert_eq!(profile.teacher_id, None);
    }

    #[tokio::test]
    async fn test_password_reset_flow_without_email_service() {
        let (db, api) = setup().await;
        let code = access_code(&db).await;

        api.signup(teacher_signup("t@example.com", &code)).await.unwrap();

        // Request always succeeds, known email or not
        let known = api
            .request_password_reset(Json(PasswordResetRequest {
                email: "t@example.com".to_string(),
            }))
            .await;
        assert!(known.is_ok());

        let unknown = api
            .request_password_reset(Json(PasswordResetRequest {
                email: "ghost@example.com".to_string(),
            }))
            .await;
        assert!(unknown.is_ok());
    }

    #[tokio::test]
    async fn test_password_reset_confirm_with_bad_token_fails() {
        let (_db, api) = setup().await;

        let result = api
            .confirm_password_reset(Json(PasswordResetConfirmRequest {
                token: "not-a-real-token".to_string(),
                new_password: "brand-new-password".to_string(),
            }))
            .await;

        assert!(matches!(result, Err(AuthError::InvalidResetToken(_))));
    }
}
