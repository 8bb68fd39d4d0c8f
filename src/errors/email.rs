/// Errors from the transactional email client
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Email delivery is not configured for this deployment
    #[error("email service is not configured")]
    NotConfigured,

    /// Network failure talking to the email API
    #[error("email network error: {0}")]
    Network(String),

    /// The email API rejected the request
    #[error("email API error: {0}")]
    Api(String),
}
