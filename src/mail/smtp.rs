use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{Email, Mailer};
use crate::error::AppError;

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// 587 for STARTTLS.
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

/// Delivers mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                AppError::ConfigError(format!("Invalid SMTP relay '{}': {}", config.host, e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let mut builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build_message(email: &Email) -> Result<Message, AppError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&email.from)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &email.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        builder
            .body(email.body.clone())
            .map_err(|e| AppError::MailError(format!("Failed to build message: {}", e)))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, AppError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| AppError::MailError(format!("Invalid address '{}': {}", address, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        email.validate()?;
        let message = Self::build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::MailError(format!("SMTP delivery failed: {}", e)))?;
        log::info!("Mail '{}' delivered to {} recipient(s)", email.subject, email.to.len());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: None,
            password: None,
            starttls: false,
        }
    }

    #[test]
    fn test_mailer_builds_without_connecting() {
        assert!(SmtpMailer::new(&config()).is_ok());
    }

    #[test]
    fn test_message_carries_envelope_and_body() {
        let email = Email::new(
            "u7@example.com",
            vec!["techsupport@braniac.com".to_string()],
            "TechSupport Help",
            "test_message_text",
        );
        let message = SmtpMailer::build_message(&email).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("From: u7@example.com"));
        assert!(formatted.contains("To: techsupport@braniac.com"));
        assert!(formatted.contains("test_message_text"));
    }

    #[test]
    fn test_invalid_sender_is_a_mail_error() {
        let email = Email::new("not an address", vec!["a@b.c".to_string()], "S", "B");
        assert!(matches!(
            SmtpMailer::build_message(&email),
            Err(AppError::MailError(_))
        ));
    }
}
