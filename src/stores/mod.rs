// Store layer - repository access to the database
pub mod admin_code_store;
pub mod credential_store;
pub mod project_store;
pub mod submission_store;
pub mod user_store;

pub use admin_code_store::AdminCodeStore;
pub use credential_store::CredentialStore;
pub use project_store::ProjectStore;
pub use submission_store::SubmissionStore;
pub use user_store::UserStore;
