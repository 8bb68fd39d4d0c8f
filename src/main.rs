mod api;
mod config;
mod errors;
mod services;
mod stores;
mod types;

use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;
use sea_orm::{Database, DatabaseConnection, TransactionTrait};
use std::sync::Arc;

use api::{AdminApi, AuthApi, HealthApi, OpsApi, ProjectsApi, ReviewApi};
use config::AppSettings;
use migration::{Migrator, MigratorTrait};
use services::{DeletionService, EmailService, ReviewService, TokenService};
use stores::{AdminCodeStore, CredentialStore, ProjectStore, SubmissionStore, UserStore};
use types::db::user::UserRole;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();

    config::init_logging().expect("Failed to initialize logging");

    // Missing required secrets abort here, before any side effect.
    let settings = AppSettings::from_env().expect("Invalid configuration");

    let db: DatabaseConnection = Database::connect(&settings.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!(database_url = %settings.database_url, "connected to database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    tracing::info!("database migrations completed");

    let credential_store = Arc::new(CredentialStore::new(settings.password_pepper.clone()));
    let user_store = Arc::new(UserStore::new());
    let project_store = Arc::new(ProjectStore::new());
    let submission_store = Arc::new(SubmissionStore::new());
    let admin_code_store = Arc::new(AdminCodeStore::new());

    let token_service = Arc::new(TokenService::new(
        settings.jwt_secret.clone(),
        settings.refresh_token_secret.clone(),
    ));
    let email_service = settings
        .email
        .clone()
        .map(|email_settings| Arc::new(EmailService::new(email_settings)));
    let review_service = Arc::new(ReviewService::new(
        db.clone(),
        Arc::clone(&project_store),
        Arc::clone(&submission_store),
    ));
    let deletion_service = Arc::new(DeletionService::new(
        db.clone(),
        Arc::clone(&credential_store),
        Arc::clone(&user_store),
        Arc::clone(&project_store),
        Arc::clone(&submission_store),
    ));

    if let Some(admin) = &settings.bootstrap_admin {
        seed_admin(&db, &credential_store, &user_store, admin).await;
    }

    // Surface the signup code on first boot so the operator can onboard
    // the first teacher.
    match admin_code_store.get(&db).await {
        Ok(row) => tracing::info!(access_code = %row.access_code, "teacher signup code ready"),
        Err(e) => tracing::error!(error = %e, "failed to initialize signup code"),
    }

    let auth_api = AuthApi::new(
        db.clone(),
        Arc::clone(&credential_store),
        Arc::clone(&user_store),
        Arc::clone(&project_store),
        Arc::clone(&admin_code_store),
        Arc::clone(&token_service),
        email_service.clone(),
        &settings,
    );
    let projects_api = ProjectsApi::new(
        db.clone(),
        Arc::clone(&token_service),
        Arc::clone(&user_store),
        Arc::clone(&project_store),
        Arc::clone(&submission_store),
    );
    let review_api = ReviewApi::new(
        db.clone(),
        Arc::clone(&token_service),
        Arc::clone(&user_store),
        Arc::clone(&project_store),
        Arc::clone(&submission_store),
        Arc::clone(&review_service),
    );
    let admin_api = AdminApi::new(
        db.clone(),
        Arc::clone(&token_service),
        Arc::clone(&user_store),
        Arc::clone(&project_store),
        Arc::clone(&admin_code_store),
        Arc::clone(&review_service),
    );
    let ops_api = OpsApi::new(
        db.clone(),
        Arc::clone(&credential_store),
        Arc::clone(&user_store),
        Arc::clone(&deletion_service),
        email_service,
        settings.service_key.clone(),
    );

    let api_service = OpenApiService::new(
        (HealthApi, auth_api, projects_api, review_api, admin_api, ops_api),
        "Orbilius Backend",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/api", settings.public_base_url));

    let ui = api_service.swagger_ui();

    let app = Route::new()
        .nest("/api", api_service)
        .nest("/swagger", ui);

    tracing::info!(bind_addr = %settings.bind_addr, "starting server");

    Server::new(TcpListener::bind(settings.bind_addr.clone()))
        .run(app)
        .await
}

/// Create the operator-configured admin account if it does not exist yet.
async fn seed_admin(
    db: &DatabaseConnection,
    credential_store: &CredentialStore,
    user_store: &UserStore,
    admin: &config::BootstrapAdmin,
) {
    let email = admin.email.trim().to_lowercase();

    let exists = match credential_store.email_exists(db, &email).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!(error = %e, "failed to check for admin account");
            return;
        }
    };
    if exists {
        tracing::info!("admin account already exists, skipping seed");
        return;
    }

    let result = async {
        let txn = db.begin().await?;
        let user_id = credential_store
            .add_account(&txn, &email, &admin.password)
            .await
            .map_err(|e| sea_orm::DbErr::Custom(e.message()))?;
        user_store
            .create_profile(
                &txn,
                &user_id,
                &email,
                UserRole::Admin,
                &admin.first_name,
                &admin.last_name,
                None,
            )
            .await?;
        txn.commit().await?;
        Ok::<_, sea_orm::DbErr>(user_id)
    }
    .await;

    match result {
        Ok(user_id) => tracing::info!(user_id = %user_id, "admin account created"),
        Err(e) => tracing::error!(error = %e, "failed to seed admin account"),
    }
}
