use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use feedesk_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub api_public_key: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub session_idle_minutes: i64,
    pub invitation_ttl: chrono::Duration,
    pub bulk_row_timeout: Duration,
    pub bulk_concurrency: usize,
    pub email_provider: EmailProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let variables = Variables { lookup: &lookup };

        let database_url = variables.required("DATABASE_URL")?;
        let database_max_connections = variables.parsed("DATABASE_MAX_CONNECTIONS", 10_u32)?;
        let api_public_key = variables.required_non_empty("API_PUBLIC_KEY")?;
        let bootstrap_token = variables.required_non_empty("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = variables.required("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let frontend_url = variables
            .optional("FRONTEND_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let api_host = variables
            .optional("API_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = variables.parsed("API_PORT", 3001_u16)?;
        let cookie_secure = variables
            .optional("SESSION_COOKIE_SECURE")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let session_idle_minutes = variables.parsed("SESSION_IDLE_MINUTES", 30_i64)?;
        if database_max_connections == 0 || session_idle_minutes <= 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS and SESSION_IDLE_MINUTES must be positive".to_owned(),
            ));
        }

        let invitation_ttl_hours = variables.parsed("INVITATION_TTL_HOURS", 168_i64)?;
        if invitation_ttl_hours <= 0 {
            return Err(AppError::Validation(
                "INVITATION_TTL_HOURS must be positive".to_owned(),
            ));
        }

        let bulk_row_timeout_secs = variables.parsed("BULK_INVITE_ROW_TIMEOUT_SECS", 10_u64)?;
        let bulk_concurrency = variables.parsed("BULK_INVITE_CONCURRENCY", 8_usize)?;
        if bulk_row_timeout_secs == 0 || bulk_concurrency == 0 {
            return Err(AppError::Validation(
                "bulk invitation timeout and concurrency must be positive".to_owned(),
            ));
        }

        let email_provider = match variables
            .optional("EMAIL_PROVIDER")
            .unwrap_or_else(|| "console".to_owned())
            .as_str()
        {
            "console" => EmailProviderConfig::Console,
            "smtp" => EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                host: variables.required_non_empty("SMTP_HOST")?,
                port: variables
                    .required_non_empty("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?,
                username: variables.required_non_empty("SMTP_USERNAME")?,
                password: variables.required_non_empty("SMTP_PASSWORD")?,
                from_address: variables.required_non_empty("SMTP_FROM_ADDRESS")?,
            }),
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            database_max_connections,
            api_public_key,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            session_idle_minutes,
            invitation_ttl: chrono::Duration::hours(invitation_ttl_hours),
            bulk_row_timeout: Duration::from_secs(bulk_row_timeout_secs),
            bulk_concurrency,
            email_provider,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct Variables<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Variables<'_> {
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String, AppError> {
        (self.lookup)(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    fn required_non_empty(&self, name: &str) -> Result<String, AppError> {
        let value = self.required(name)?;
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} must not be empty")));
        }

        Ok(value)
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use feedesk_core::AppError;

    use super::{ApiConfig, EmailProviderConfig};

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/feedesk".to_owned()),
            ("API_PUBLIC_KEY", "public-anon-key".to_owned()),
            ("AUTH_BOOTSTRAP_TOKEN", "bootstrap-secret".to_owned()),
            ("SESSION_SECRET", "s".repeat(32)),
        ])
    }

    fn load(variables: &HashMap<&'static str, String>) -> Result<ApiConfig, AppError> {
        ApiConfig::from_lookup(false, |name| variables.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_variables_are_absent() {
        let config = load(&base()).unwrap_or_else(|error| panic!("config should load: {error}"));

        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.api_port, 3001);
        assert_eq!(config.invitation_ttl, chrono::Duration::hours(168));
        assert_eq!(config.bulk_row_timeout.as_secs(), 10);
        assert_eq!(config.bulk_concurrency, 8);
        assert_eq!(config.email_provider, EmailProviderConfig::Console);
        assert!(!config.cookie_secure);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.session_idle_minutes, 30);
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let mut variables = base();
        variables.insert("SESSION_SECRET", "too-short".to_owned());

        assert!(matches!(load(&variables), Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let mut variables = base();
        variables.remove("API_PUBLIC_KEY");

        assert!(matches!(load(&variables), Err(AppError::Validation(_))));
    }

    #[test]
    fn smtp_provider_requires_relay_settings() {
        let mut variables = base();
        variables.insert("EMAIL_PROVIDER", "smtp".to_owned());
        assert!(load(&variables).is_err());

        variables.extend([
            ("SMTP_HOST", "smtp.college.edu".to_owned()),
            ("SMTP_PORT", "587".to_owned()),
            ("SMTP_USERNAME", "mailer".to_owned()),
            ("SMTP_PASSWORD", "secret".to_owned()),
            ("SMTP_FROM_ADDRESS", "noreply@college.edu".to_owned()),
        ]);
        let config =
            load(&variables).unwrap_or_else(|error| panic!("smtp config should load: {error}"));
        assert!(matches!(
            config.email_provider,
            EmailProviderConfig::Smtp(smtp) if smtp.port == 587
        ));
    }

    #[test]
    fn invalid_numbers_and_trailing_slash_are_handled() {
        let mut variables = base();
        variables.insert("FRONTEND_URL", "https://fees.college.edu/".to_owned());
        variables.insert("BULK_INVITE_CONCURRENCY", "0".to_owned());
        assert!(load(&variables).is_err());

        variables.insert("BULK_INVITE_CONCURRENCY", "4".to_owned());
        let config = load(&variables).unwrap_or_else(|error| panic!("config should load: {error}"));
        assert_eq!(config.frontend_url, "https://fees.college.edu");
        assert_eq!(config.bulk_concurrency, 4);
    }
}
