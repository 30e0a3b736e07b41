use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::config::Config;
use crate::db::{ContentRepository, UserRepository};
use crate::jobs::{JobContext, JobQueue};
use crate::mail::Mailer;

/// Tunables handlers read at request time.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub feedback_cache_ttl: Duration,
    pub feedback_mail_lock: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feedback_cache_ttl: Duration::from_secs(300),
            feedback_mail_lock: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            feedback_cache_ttl: config.feedback_cache_ttl,
            feedback_mail_lock: config.feedback_mail_lock,
        }
    }
}

/// Services shared by every handler, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub cache: Arc<dyn Cache>,
    pub queue: Arc<dyn JobQueue>,
    pub mailer: Arc<dyn Mailer>,
    pub settings: Settings,
}

impl AppState {
    /// What background jobs get to see of the application.
    pub fn job_context(&self) -> JobContext {
        JobContext {
            users: self.users.clone(),
            mailer: self.mailer.clone(),
        }
    }
}
