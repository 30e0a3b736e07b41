//! Background job system
//!
//! Handlers enqueue jobs as JSON payloads; a `WorkerPool` claims them and runs
//! the matching handler. Failed jobs are retried with exponential backoff
//! (`retry_backoff_seconds * 2^retry_count`) until `max_retries` is used up,
//! then parked in the queue's failed list.

mod config;
mod feedback;
mod in_memory;
mod worker;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use config::JobsConfig;
pub use feedback::{
    enqueue_feedback_mail, send_feedback_mail, FeedbackMessage, FEEDBACK_SUBJECT,
    SEND_FEEDBACK_MAIL, SUPPORT_ADDRESS,
};
pub use in_memory::{FailedJob, InMemoryJobQueue};
pub use worker::{JobContext, JobWorker, WorkerPool};

/// A job as stored in a queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobData {
    pub job_id: String,
    /// Selects the handler, e.g. `send_feedback_mail`.
    pub job_type: String,
    pub payload: serde_json::Value,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Not claimable before this instant; `None` means right away.
    pub run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl JobData {
    pub fn new(job_id: String, job_type: String, payload: serde_json::Value, max_retries: u32) -> Self {
        Self {
            job_id,
            job_type,
            payload,
            retry_count: 0,
            max_retries,
            run_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn should_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Increment retry count and return new count
    pub fn increment_retry(&mut self) -> u32 {
        self.retry_count += 1;
        self.retry_count
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.run_at.map_or(true, |at| at <= now)
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Adds a job and returns its id.
    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> Result<String, AppError>;

    /// Claims the next due job, moving it to the processing set.
    async fn dequeue(&self) -> Result<Option<JobData>, AppError>;

    async fn complete(&self, job_id: &str) -> Result<(), AppError>;

    /// Records a failed attempt and applies the retry policy.
    async fn fail(&self, job_id: &str, error: String) -> Result<(), AppError>;

    fn is_healthy(&self) -> bool;
}
