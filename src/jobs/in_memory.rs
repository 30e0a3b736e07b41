//! In-memory job queue implementation
//!
//! Suitable for development, tests and single-instance deployments; jobs do
//! not survive a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{JobData, JobQueue, JobsConfig};
use crate::error::AppError;

/// Default maximum size for completed/failed job history
const DEFAULT_MAX_HISTORY_SIZE: usize = 10_000;

/// A job that used up its retries, with the last error it produced.
#[derive(Debug, Clone)]
pub struct FailedJob {
    pub job: JobData,
    pub error: String,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<JobData>,
    processing: HashMap<String, JobData>,
    /// Retries waiting for their backoff to elapse.
    scheduled: Vec<JobData>,
    completed: VecDeque<JobData>,
    failed: VecDeque<FailedJob>,
}

impl QueueState {
    /// Moves scheduled jobs whose time has come to the back of `pending`.
    fn promote_due(&mut self) {
        let now = Utc::now();
        let (due, waiting): (Vec<JobData>, Vec<JobData>) =
            self.scheduled.drain(..).partition(|job| job.is_due(now));
        self.scheduled = waiting;
        self.pending.extend(due);
    }
}

/// Job queue kept in process memory.
///
/// The completed and failed lists are bounded; the oldest entries are
/// discarded once `max_history_size` is reached.
pub struct InMemoryJobQueue {
    state: Mutex<QueueState>,
    config: JobsConfig,
    max_history_size: usize,
}

impl InMemoryJobQueue {
    pub fn new(config: JobsConfig) -> Self {
        Self::with_history_limit(config, DEFAULT_MAX_HISTORY_SIZE)
    }

    pub fn with_history_limit(config: JobsConfig, max_history_size: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            config,
            max_history_size,
        }
    }

    fn push_bounded<T>(history: &mut VecDeque<T>, item: T, max_size: usize) {
        if history.len() >= max_size {
            history.pop_front();
        }
        history.push_back(item);
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn scheduled_count(&self) -> usize {
        self.state.lock().await.scheduled.len()
    }

    pub async fn completed_count(&self) -> usize {
        self.state.lock().await.completed.len()
    }

    pub async fn failed_jobs(&self) -> Vec<FailedJob> {
        self.state.lock().await.failed.iter().cloned().collect()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job_type: &str, payload: serde_json::Value) -> Result<String, AppError> {
        let job_id = Uuid::new_v4().to_string();
        let job = JobData::new(
            job_id.clone(),
            job_type.to_string(),
            payload,
            self.config.max_retries,
        );
        self.state.lock().await.pending.push_back(job);
        log::debug!("Enqueued job {} ({})", job_id, job_type);
        Ok(job_id)
    }

    async fn dequeue(&self) -> Result<Option<JobData>, AppError> {
        let mut state = self.state.lock().await;
        state.promote_due();
        match state.pending.pop_front() {
            Some(job) => {
                state.processing.insert(job.job_id.clone(), job.clone());
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    async fn complete(&self, job_id: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if let Some(job) = state.processing.remove(job_id) {
            Self::push_bounded(&mut state.completed, job, self.max_history_size);
        }
        Ok(())
    }

    async fn fail(&self, job_id: &str, error: String) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let Some(mut job) = state.processing.remove(job_id) else {
            return Ok(());
        };

        if job.should_retry() {
            let delay = chrono::Duration::from_std(self.config.backoff(job.retry_count))
                .unwrap_or_else(|_| chrono::Duration::weeks(52));
            let now = Utc::now();
            job.run_at = Some(now.checked_add_signed(delay).unwrap_or(now));
            let attempt = job.increment_retry();
            log::warn!(
                "Job {} failed ({}), retry {}/{} scheduled",
                job_id,
                error,
                attempt,
                job.max_retries
            );
            state.scheduled.push(job);
        } else {
            log::error!("Job {} failed permanently: {}", job_id, error);
            Self::push_bounded(&mut state.failed, FailedJob { job, error }, self.max_history_size);
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
