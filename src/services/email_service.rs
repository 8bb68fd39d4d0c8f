use serde_json::json;

use crate::config::EmailSettings;
use crate::errors::EmailError;

/// EmailService sends templated HTML email through an HTTP delivery API.
///
/// One recipient per call, no retries; a failed send is surfaced to the
/// caller to retry manually.
pub struct EmailService {
    client: reqwest::Client,
    settings: EmailSettings,
}

impl EmailService {
    pub fn new(settings: EmailSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Send a signup invitation.
    pub async fn send_invite(
        &self,
        to: &str,
        role: &str,
        signup_url: &str,
    ) -> Result<(), EmailError> {
        let (subject, html) = render_invite(role, signup_url);
        self.send(to, &subject, &html).await
    }

    /// Send a password-reset link.
    pub async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<(), EmailError> {
        let (subject, html) = render_password_reset(reset_url);
        self.send(to, &subject, &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let body = json!({
            "from": self.settings.from_address,
            "to": to,
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmailError::Api(format!(
                "delivery API returned status: {}",
                response.status()
            )));
        }

        tracing::info!(to, subject, "email accepted for delivery");
        Ok(())
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("api_url", &self.settings.api_url)
            .field("api_key", &"<redacted>")
            .field("from_address", &self.settings.from_address)
            .finish()
    }
}

/// Invitation email content for a role and signup link.
fn render_invite(role: &str, signup_url: &str) -> (String, String) {
    let subject = "You're invited to Orbilius".to_string();
    let html = format!(
        "<html><body>\
         <h2>Welcome to Orbilius</h2>\
         <p>You have been invited to join Orbilius as a {}.</p>\
         <p><a href=\"{}\">Create your account</a></p>\
         <p>If you were not expecting this invitation you can ignore this email.</p>\
         </body></html>",
        role, signup_url
    );
    (subject, html)
}

/// Password-reset email content.
fn render_password_reset(reset_url: &str) -> (String, String) {
    let subject = "Reset your Orbilius password".to_string();
    let html = format!(
        "<html><body>\
         <h2>Password reset</h2>\
         <p>Follow the link below to choose a new password. The link expires in one hour.</p>\
         <p><a href=\"{}\">Reset password</a></p>\
         <p>If you did not request this, you can ignore this email.</p>\
         </body></html>",
        reset_url
    );
    (subject, html)
}
