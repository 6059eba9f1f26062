use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::{
    config::{MailConfig, MailTransport},
    error::AppError,
};

/// A fully rendered message for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Outbound mail transport. Each call is independent and may fail on its own.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), AppError>;
}

/// Picks the transport named in the configuration.
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, AppError> {
    let mailer: Arc<dyn Mailer> = match config.transport {
        MailTransport::Log => Arc::new(LogMailer::new()),
        MailTransport::Smtp => Arc::new(SmtpMailer::new(config)?),
    };
    Ok(mailer)
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        let builder = if config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|err| AppError::Config(format!("SMTP relay error: {err}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };
        let mut builder = builder.port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let address = config
            .from_address
            .parse::<Address>()
            .map_err(|err| AppError::Config(format!("invalid MAIL_FROM_ADDRESS: {err}")))?;

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|err| AppError::Mail(format!("invalid recipient {}: {err}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body.clone())
            .map_err(|err| AppError::Mail(format!("failed to build email: {err}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|err| AppError::Mail(format!("failed to send email: {err}")))?;
        Ok(())
    }
}

/// Development transport: every message goes to the log instead of the wire.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), AppError> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.html_body,
            "mail not sent, log transport active"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config(from_address: &str) -> MailConfig {
        MailConfig {
            transport: MailTransport::Smtp,
            smtp_host: "localhost".into(),
            smtp_port: 1025,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: false,
            from_name: "Equipe Planner".into(),
            from_address: from_address.into(),
        }
    }

    #[tokio::test]
    async fn log_transport_accepts_everything() {
        let mail = OutgoingMail {
            to: "b@x.com".into(),
            subject: "hello".into(),
            html_body: "<p>hi</p>".into(),
        };
        LogMailer::new().send(&mail).await.expect("logged");
    }

    #[test]
    fn smtp_transport_builds_without_connecting() {
        assert!(mailer_from_config(&smtp_config("teste@plann.er")).is_ok());
    }

    #[test]
    fn bad_sender_address_is_a_config_error() {
        assert!(matches!(
            SmtpMailer::new(&smtp_config("not an address")),
            Err(AppError::Config(_))
        ));
    }
}
