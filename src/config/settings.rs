use std::env;

/// Application settings, read once from the environment at startup.
///
/// Required secrets are validated here so that a misconfigured deployment
/// fails before any request is served.
#[derive(Clone)]
pub struct AppSettings {
    pub database_url: String,
    pub bind_addr: String,
    pub public_base_url: String,
    pub jwt_secret: String,
    pub refresh_token_secret: String,
    pub password_pepper: String,
    /// Bearer key for the service-credentialed ops endpoints. Optional: when
    /// absent the ops surface reports a configuration error instead.
    pub service_key: Option<String>,
    pub email: Option<EmailSettings>,
    /// Seed admin account created at startup when configured.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Transactional email API settings. All three values are required together.
#[derive(Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("email configuration is incomplete: {0} is not set")]
    IncompleteEmailConfig(&'static str),
}

fn required(name: &'static str) -> Result<String, SettingsError> {
    env::var(name).map_err(|_| SettingsError::MissingVar(name))
}

impl AppSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://orbilius.db?mode=rwc".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let jwt_secret = required("JWT_SECRET")?;
        let refresh_token_secret = required("REFRESH_TOKEN_SECRET")?;
        let password_pepper = required("PASSWORD_PEPPER")?;
        let service_key = env::var("SERVICE_KEY").ok();

        // Either every email variable is present or none of them are.
        let email = match env::var("EMAIL_API_URL").ok() {
            Some(api_url) => Some(EmailSettings {
                api_url,
                api_key: env::var("EMAIL_API_KEY")
                    .map_err(|_| SettingsError::IncompleteEmailConfig("EMAIL_API_KEY"))?,
                from_address: env::var("EMAIL_FROM")
                    .map_err(|_| SettingsError::IncompleteEmailConfig("EMAIL_FROM"))?,
            }),
            None => None,
        };

        let bootstrap_admin = match env::var("ADMIN_EMAIL").ok() {
            Some(email) => Some(BootstrapAdmin {
                email,
                password: required("ADMIN_PASSWORD")?,
                first_name: env::var("ADMIN_FIRST_NAME").unwrap_or_else(|_| "Site".to_string()),
                last_name: env::var("ADMIN_LAST_NAME").unwrap_or_else(|_| "Admin".to_string()),
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            public_base_url,
            jwt_secret,
            refresh_token_secret,
            password_pepper,
            service_key,
            email,
            bootstrap_admin,
        })
    }
}

impl std::fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettings")
            .field("database_url", &self.database_url)
            .field("bind_addr", &self.bind_addr)
            .field("public_base_url", &self.public_base_url)
            .field("jwt_secret", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email.as_ref().map(|e| e.api_url.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; settings tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "DATABASE_URL",
            "BIND_ADDR",
            "PUBLIC_BASE_URL",
            "JWT_SECRET",
            "REFRESH_TOKEN_SECRET",
            "PASSWORD_PEPPER",
            "SERVICE_KEY",
            "EMAIL_API_URL",
            "EMAIL_API_KEY",
            "EMAIL_FROM",
            "ADMIN_EMAIL",
            "ADMIN_PASSWORD",
            "ADMIN_FIRST_NAME",
            "ADMIN_LAST_NAME",
        ] {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    fn set_required() {
        unsafe {
            std::env::set_var("JWT_SECRET", "jwt-secret-minimum-32-characters-long");
            std::env::set_var("REFRESH_TOKEN_SECRET", "refresh-secret-minimum-32-chars!");
            std::env::set_var("PASSWORD_PEPPER", "pepper-secret-value");
        }
    }

    #[test]
    fn test_missing_jwt_secret_fails_fast() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let result = AppSettings::from_env();

        assert!(matches!(result, Err(SettingsError::MissingVar("JWT_SECRET"))));
    }

    #[test]
    fn test_defaults_applied_when_optional_vars_absent() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();

        let settings = AppSettings::from_env().unwrap();

        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
        assert!(settings.service_key.is_none());
        assert!(settings.email.is_none());
        assert!(settings.bootstrap_admin.is_none());
    }

    #[test]
    fn test_partial_email_config_is_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();
        unsafe {
            std::env::set_var("EMAIL_API_URL", "https://mail.example.com/send");
        }

        let result = AppSettings::from_env();

        assert!(matches!(
            result,
            Err(SettingsError::IncompleteEmailConfig("EMAIL_API_KEY"))
        ));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        set_required();

        let settings = AppSettings::from_env().unwrap();
        let debug_output = format!("{:?}", settings);

        assert!(!debug_output.contains("jwt-secret-minimum"));
        assert!(!debug_output.contains("pepper-secret-value"));
        assert!(debug_output.contains("<redacted>"));
    }
}
