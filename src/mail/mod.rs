//! Outgoing mail.
//!
//! - `SmtpMailer` delivers through an SMTP relay using lettre
//! - `MemoryMailer` keeps messages in an outbox, for development and tests

mod memory;
mod smtp;

use async_trait::async_trait;

use crate::error::AppError;

pub use memory::MemoryMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

/// Which `Mailer` the process is wired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    Memory,
    Smtp,
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn new(
        from: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to,
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Checks the envelope is complete before it reaches a transport.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.from.trim().is_empty() {
            return Err(AppError::MailError("Email 'from' is required".into()));
        }
        if self.to.is_empty() {
            return Err(AppError::MailError("Email 'to' is required".into()));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::MailError("Email 'subject' is required".into()));
        }
        Ok(())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message. Delivery problems are returned, never swallowed.
    async fn send(&self, email: &Email) -> Result<(), AppError>;

    fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        let email = Email::new(
            "u7@example.com",
            vec!["techsupport@braniac.com".to_string()],
            "TechSupport Help",
            "hello",
        );
        assert!(email.validate().is_ok());

        let no_sender = Email {
            from: "".to_string(),
            ..email.clone()
        };
        assert!(no_sender.validate().is_err());

        let no_recipients = Email {
            to: vec![],
            ..email
        };
        assert!(no_recipients.validate().is_err());
    }
}
