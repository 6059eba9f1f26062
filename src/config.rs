use std::{env, net::SocketAddr};

use url::Url;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    /// Base of every link handed out to browsers and mail recipients, without a
    /// trailing slash.
    pub web_base_url: String,
    pub mail: MailConfig,
    pub date_locale: String,
    pub date_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransport {
    Log,
    Smtp,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: MailTransport,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub from_name: String,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://planner.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3333".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let web_base_url = normalize_base_url(
            &env::var("WEB_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        )?;

        let date_locale = env::var("DATE_LOCALE").unwrap_or_else(|_| "pt_BR".to_string());
        let date_pattern =
            env::var("DATE_PATTERN").unwrap_or_else(|_| "%-d de %B de %Y".to_string());

        Ok(Self {
            database_url,
            listen_addr,
            web_base_url,
            mail: MailConfig::from_env()?,
            date_locale,
            date_pattern,
        })
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, AppError> {
        let transport = match env::var("MAIL_TRANSPORT")
            .unwrap_or_else(|_| "log".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "log" => MailTransport::Log,
            "smtp" => MailTransport::Smtp,
            other => {
                return Err(AppError::Config(format!(
                    "invalid MAIL_TRANSPORT: {other} (expected `log` or `smtp`)"
                )))
            }
        };

        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
        if transport == MailTransport::Smtp && smtp_host.trim().is_empty() {
            return Err(AppError::Config("SMTP_HOST must not be empty".into()));
        }
        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid SMTP_PORT: {err}")))?;
        let smtp_tls = env::var("SMTP_TLS")
            .map(|value| !matches!(value.trim(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Ok(Self {
            transport,
            smtp_host,
            smtp_port,
            smtp_username: non_empty_var("SMTP_USERNAME"),
            smtp_password: non_empty_var("SMTP_PASSWORD"),
            smtp_tls,
            from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "Equipe Planner".into()),
            from_address: env::var("MAIL_FROM_ADDRESS").unwrap_or_else(|_| "teste@plann.er".into()),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Checks that `raw` is an absolute URL and returns its serialized form without
/// the trailing slash, so links can be joined with `format!`. Serializing
/// percent-encodes characters such as `"` that would break an `href`.
pub fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| AppError::Config(format!("invalid WEB_BASE_URL {trimmed:?}: {err}")))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}
