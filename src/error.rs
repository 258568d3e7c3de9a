use std::fmt;
use std::path::PathBuf;

use crate::types::JobStatus;

/// The pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GenerateImage,
    EncodeImage,
    CreateJob,
    PollJob,
    DownloadAssets,
}

impl Stage {
    /// The message shown to the user when the run aborts in this stage.
    pub fn abort_message(&self) -> &'static str {
        match self {
            Stage::GenerateImage => "Image generation failed!",
            Stage::EncodeImage => "Image encoding failed!",
            Stage::CreateJob => "3D task creation failed!",
            Stage::PollJob => "3D model creation failed!",
            Stage::DownloadAssets => "Failed to download 3D model!",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::GenerateImage => "image generation",
            Stage::EncodeImage => "image encoding",
            Stage::CreateJob => "job creation",
            Stage::PollJob => "job polling",
            Stage::DownloadAssets => "asset download",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("API key is missing. Please set the {0} environment variable.")]
    MissingApiKey(&'static str),
    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
    #[error("API key contains characters that are not valid in an HTTP header")]
    InvalidApiKey,
    #[error("Prompt is required")]
    EmptyPrompt,
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Failed to parse API response: {0}")]
    ResponseParseFailed(#[from] serde_json::Error),
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// The image-generation endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Request { status: u16, body: String },
    /// The image-generation endpoint rejected the prompt on moderation grounds.
    #[error("Generation failed NSFW classifier")]
    ContentFiltered,
    #[error("Error encoding image {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to create task. HTTP Status: {status}, Response: {body}")]
    JobCreation { status: u16, body: String },
    #[error("Failed to fetch task status. HTTP Status: {status}, Response: {body}")]
    JobStatus { status: u16, body: String },
    #[error("Task {status}: {}", .message.as_deref().unwrap_or("no message"))]
    JobFailed {
        status: JobStatus,
        message: Option<String>,
    },
    #[error("Task {job_id} still not finished after {attempts} status checks")]
    PollAttemptsExhausted { job_id: String, attempts: u32 },
    #[error("Task {job_id} still not finished after {elapsed_secs}s")]
    PollTimedOut { job_id: String, elapsed_secs: u64 },
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Failed to download {url}: status {status}")]
    Download { url: String, status: u16 },
    #[error("Task {job_id} produced no {format} file")]
    MissingPrimaryAsset { job_id: String, format: String },
    #[error("Refusing to use {0:?} as a path component")]
    InvalidIdentifier(String),
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Tags this error with the stage it came from.
    pub fn during(self, stage: Stage) -> Self {
        PipelineError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The stage this error was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
