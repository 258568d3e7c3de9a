use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::MeshyClient;
use crate::error::PipelineError;
use crate::types::{ConversionJob, JobStatus, PollPolicy};

/// Waits for a conversion job to reach a terminal state.
///
/// Each status check replaces the previous snapshot. Between checks the
/// poller sleeps for `policy.interval`; the sleep and the in-flight request
/// are both abandoned as soon as the cancellation token fires.
pub struct JobPoller<'a> {
    client: &'a MeshyClient,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl<'a> JobPoller<'a> {
    pub fn new(client: &'a MeshyClient, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Polls until the job succeeds, fails or expires.
    ///
    /// # Returns
    ///
    /// The job record from the first `SUCCEEDED` response.
    ///
    /// # Errors
    ///
    /// - `PipelineError::JobStatus` if a status request returns anything but 200.
    /// - `PipelineError::JobFailed` if the job ends as `FAILED` or `EXPIRED`.
    /// - `PipelineError::PollAttemptsExhausted` / `PollTimedOut` when the policy's
    ///   bounds are hit.
    /// - `PipelineError::Cancelled` if the token is cancelled.
    pub async fn poll_until_terminal(&self, job_id: &str) -> Result<ConversionJob, PipelineError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let job = tokio::select! {
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                job = self.client.get_job(job_id) => job?,
            };

            match job.status.clone() {
                JobStatus::Succeeded => {
                    info!(job_id, attempts, "task completed successfully");
                    return Ok(job);
                }
                status @ (JobStatus::Failed | JobStatus::Expired) => {
                    warn!(
                        job_id,
                        %status,
                        message = job.message.as_deref().unwrap_or_default(),
                        "task failed or expired"
                    );
                    return Err(PipelineError::JobFailed {
                        status,
                        message: job.message,
                    });
                }
                status => {
                    if let Some(max_attempts) = self.policy.max_attempts {
                        if attempts >= max_attempts {
                            return Err(PipelineError::PollAttemptsExhausted {
                                job_id: job_id.to_string(),
                                attempts,
                            });
                        }
                    }
                    if let Some(timeout) = self.policy.timeout {
                        let elapsed = started.elapsed();
                        if elapsed + self.policy.interval > timeout {
                            return Err(PipelineError::PollTimedOut {
                                job_id: job_id.to_string(),
                                elapsed_secs: elapsed.as_secs(),
                            });
                        }
                    }

                    info!(
                        job_id,
                        %status,
                        progress = job.progress.unwrap_or_default(),
                        "task status: {}. Retrying in {:?}...",
                        status,
                        self.policy.interval
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                        _ = sleep(self.policy.interval) => {}
                    }
                }
            }
        }
    }
}
