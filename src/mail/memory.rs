use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Email, Mailer};
use crate::error::AppError;

/// Mailer that appends every message to an outbox instead of delivering it.
///
/// Clones share the same outbox, so a test can keep one handle and give
/// another to the application.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<Email>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub async fn outbox(&self) -> Vec<Email> {
        self.outbox.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.outbox.lock().await.clear();
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        email.validate()?;
        log::info!(
            "Mail '{}' from {} to {} recipient(s) stored in outbox",
            email.subject,
            email.from,
            email.to.len()
        );
        self.outbox.lock().await.push(email.clone());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_outbox_is_shared_between_clones() {
        let mailer = MemoryMailer::new();
        let handle = mailer.clone();
        let email = Email::new("from@test.com", vec!["to@test.com".to_string()], "Subject", "Body");

        mailer.send(&email).await.unwrap();

        assert_eq!(handle.outbox().await, vec![email]);
        handle.clear().await;
        assert!(mailer.outbox().await.is_empty());
    }

    #[actix_rt::test]
    async fn test_invalid_email_is_rejected() {
        let mailer = MemoryMailer::new();
        let email = Email::new("from@test.com", vec![], "Subject", "Body");
        assert!(mailer.send(&email).await.is_err());
        assert!(mailer.outbox().await.is_empty());
    }
}
