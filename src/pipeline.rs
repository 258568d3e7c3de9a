use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::client::MeshyClient;
use crate::config::Config;
use crate::download::AssetDownloader;
use crate::encoder::encode_as_data_uri;
use crate::error::{PipelineError, Stage};
use crate::generator::{compose_prompt, ImageGenerator};
use crate::poller::JobPoller;
use crate::types::{DownloadReport, GeneratedImage, GenerationRequest};

/// What a successful run leaves behind.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub image: GeneratedImage,
    pub job_id: String,
    pub downloads: DownloadReport,
}

/// Runs prompt → image → 3D job → downloaded assets, stopping at the first
/// failing stage. Files written by earlier stages are left in place.
pub struct Pipeline {
    config: Config,
    generator: ImageGenerator,
    meshy: MeshyClient,
    downloader: AssetDownloader,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        Ok(Self {
            generator: ImageGenerator::new(&config)?,
            meshy: MeshyClient::new(&config)?,
            downloader: AssetDownloader::new(&config)?,
            cancel: CancellationToken::new(),
            config,
        })
    }

    /// A token that aborts the run, in whichever stage it is, when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the whole pipeline for a prompt typed by the user.
    pub async fn run(&self, user_prompt: &str) -> Result<PipelineOutput, PipelineError> {
        if user_prompt.trim().is_empty() {
            return Err(PipelineError::EmptyPrompt);
        }
        self.run_request(GenerationRequest::new(compose_prompt(user_prompt)))
            .await
    }

    /// Runs the pipeline for a fully prepared generation request.
    ///
    /// Cancelling the token drops whatever request or download is in flight
    /// and returns `PipelineError::Cancelled`.
    pub async fn run_request(
        &self,
        request: GenerationRequest,
    ) -> Result<PipelineOutput, PipelineError> {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                error!("run cancelled");
                Err(PipelineError::Cancelled)
            }
            output = self.run_stages(request) => output,
        }
    }

    async fn run_stages(
        &self,
        request: GenerationRequest,
    ) -> Result<PipelineOutput, PipelineError> {
        let image = self
            .generator
            .generate(&request)
            .await
            .map_err(|e| failed(e, Stage::GenerateImage))?;
        info!(path = %image.path.display(), "image generated");

        let data_uri = encode_as_data_uri(&image.path)
            .await
            .map_err(|e| failed(e, Stage::EncodeImage))?;

        let job_id = self
            .meshy
            .create_job(&data_uri, &self.config.conversion)
            .await
            .map_err(|e| failed(e, Stage::CreateJob))?;

        let job = JobPoller::new(&self.meshy, self.config.poll.clone())
            .with_cancellation(self.cancel.clone())
            .poll_until_terminal(&job_id)
            .await
            .map_err(|e| failed(e, Stage::PollJob))?;

        let downloads = self
            .downloader
            .download_assets(&job)
            .await
            .map_err(|e| failed(e, Stage::DownloadAssets))?;
        info!(path = %downloads.primary.display(), "3D model saved");

        Ok(PipelineOutput {
            image,
            job_id,
            downloads,
        })
    }
}

fn failed(err: PipelineError, stage: Stage) -> PipelineError {
    error!(%stage, error = %err, "{}", stage.abort_message());
    err.during(stage)
}
