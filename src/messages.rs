//! One-shot notifications ("flash messages") carried in the session.
//!
//! A handler queues a message with `Messages::info` and friends; the next
//! rendered page drains the queue with `Messages::take`. Messages survive a
//! redirect and a logout, since only the user key is removed from the session.

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const MESSAGES_KEY: &str = "_messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

/// The message queue of the current session.
#[derive(Clone)]
pub struct Messages(Session);

impl Messages {
    pub fn new(session: Session) -> Self {
        Messages(session)
    }

    pub fn add(&self, level: Level, text: impl Into<String>) -> Result<(), AppError> {
        let mut queued = self.peek()?;
        queued.push(FlashMessage {
            level,
            text: text.into(),
        });
        self.0.insert(MESSAGES_KEY, queued)?;
        Ok(())
    }

    pub fn info(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.add(Level::Info, text)
    }

    pub fn success(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.add(Level::Success, text)
    }

    pub fn warning(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.add(Level::Warning, text)
    }

    /// Queued messages, left in place.
    pub fn peek(&self) -> Result<Vec<FlashMessage>, AppError> {
        Ok(self
            .0
            .get::<Vec<FlashMessage>>(MESSAGES_KEY)?
            .unwrap_or_default())
    }

    /// Removes and returns every queued message. The session is left untouched
    /// when nothing is queued.
    pub fn take(&self) -> Vec<FlashMessage> {
        match self.peek() {
            Ok(messages) if messages.is_empty() => messages,
            Ok(messages) => {
                self.0.remove(MESSAGES_KEY);
                messages
            }
            Err(e) => {
                log::warn!("Dropping unreadable flash messages: {}", e);
                self.0.remove(MESSAGES_KEY);
                Vec::new()
            }
        }
    }
}

impl FromRequest for Messages {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        Box::pin(async move { Ok(Messages(session)) })
    }
}
