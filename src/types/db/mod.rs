// Database entities (sea-orm)
pub mod admin_code;
pub mod credential;
pub mod password_reset_token;
pub mod project;
pub mod project_step;
pub mod refresh_token;
pub mod step_comment;
pub mod submission;
pub mod user;
