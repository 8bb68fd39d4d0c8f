// Error layer - per-domain API error enums plus internal error types
pub mod admin;
pub mod auth;
pub mod email;
pub mod ops;
pub mod project;

pub use admin::AdminError;
pub use auth::AuthError;
pub use email::EmailError;
pub use ops::OpsError;
pub use project::ProjectError;
