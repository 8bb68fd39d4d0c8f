// API layer - HTTP endpoints
pub mod admin;
pub mod auth;
pub mod health;
pub mod helpers;
pub mod ops;
pub mod projects;
pub mod review;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use health::HealthApi;
pub use ops::OpsApi;
pub use projects::ProjectsApi;
pub use review::ReviewApi;
