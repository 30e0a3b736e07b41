//! Job workers
//!
//! Workers poll the queue, run the handler for each job type and report the
//! outcome back so the queue can apply its retry policy.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{send_feedback_mail, FeedbackMessage, JobData, JobQueue, JobsConfig, SEND_FEEDBACK_MAIL};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::mail::Mailer;

/// Services a job handler may use.
pub struct JobContext {
    pub users: Arc<dyn UserRepository>,
    pub mailer: Arc<dyn Mailer>,
}

pub struct JobWorker {
    queue: Arc<dyn JobQueue>,
    ctx: Arc<JobContext>,
    worker_id: String,
    poll_interval: Duration,
}

impl JobWorker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        ctx: Arc<JobContext>,
        worker_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            ctx,
            worker_id: worker_id.into(),
            poll_interval,
        }
    }

    /// Runs the handler registered for the job's type.
    pub async fn execute(&self, job: &JobData) -> Result<(), AppError> {
        match job.job_type.as_str() {
            SEND_FEEDBACK_MAIL => {
                let form: FeedbackMessage = serde_json::from_value(job.payload.clone())?;
                send_feedback_mail(self.ctx.users.as_ref(), self.ctx.mailer.as_ref(), &form).await
            }
            other => Err(AppError::InternalServerError(format!(
                "No handler registered for job type: {}",
                other
            ))),
        }
    }

    /// Claims and runs one job. Returns its id, or `None` if the queue was empty.
    pub async fn process_next(&self) -> Result<Option<String>, AppError> {
        let job = match self.queue.dequeue().await? {
            Some(job) => job,
            None => return Ok(None),
        };
        let job_id = job.job_id.clone();
        log::debug!(
            "[{}] processing job {} ({}, attempt {})",
            self.worker_id,
            job_id,
            job.job_type,
            job.retry_count + 1
        );

        match self.execute(&job).await {
            Ok(()) => {
                self.queue.complete(&job_id).await?;
                log::info!("[{}] job {} completed", self.worker_id, job_id);
            }
            Err(e) => {
                log::warn!("[{}] job {} failed: {}", self.worker_id, job_id, e);
                self.queue.fail(&job_id, e.to_string()).await?;
            }
        }
        Ok(Some(job_id))
    }

    /// Processes jobs until `shutdown` turns true. A job in progress is finished first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!("[{}] job worker started", self.worker_id);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let idle = match self.process_next().await {
                Ok(Some(_)) => continue,
                Ok(None) => self.poll_interval,
                Err(e) => {
                    log::error!("[{}] error processing job: {}", self.worker_id, e);
                    Duration::from_secs(1)
                }
            };

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(idle) => {}
            }
        }

        log::info!("[{}] job worker stopped", self.worker_id);
    }
}

/// Pool of workers sharing one queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn start(queue: Arc<dyn JobQueue>, ctx: Arc<JobContext>, config: &JobsConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = (0..config.worker_count)
            .map(|i| {
                let worker = JobWorker::new(
                    queue.clone(),
                    ctx.clone(),
                    format!("worker-{}", i),
                    config.poll_interval(),
                );
                tokio::spawn(worker.run(shutdown_rx.clone()))
            })
            .collect();

        log::info!("Started {} job worker(s)", config.worker_count);
        Self {
            handles,
            shutdown_tx,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Signals every worker and waits for them to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::error!("Job worker terminated abnormally: {}", e);
            }
        }
    }
}
