//! Turn a text prompt into a downloaded 3D model.
//!
//! The pipeline asks Stability AI for an image of the prompt, sends that image
//! to Meshy's image-to-3D API, waits for the conversion job to finish and
//! downloads the resulting mesh files and thumbnail.
//!
//! ## Stages
//! - [`ImageGenerator`]: prompt to a `generated_<seed>.jpeg` on disk.
//! - [`encode_as_data_uri`]: image file to a base64 data URI.
//! - [`MeshyClient`]: job creation and status lookups.
//! - [`JobPoller`]: waits for a terminal job state.
//! - [`AssetDownloader`]: streams model files to the output directory.
//! - [`Pipeline`]: runs all of the above in order.
//!
//! Every fallible call returns `Result<_, PipelineError>`.

mod client;
mod config;
mod download;
mod encoder;
mod error;
mod generator;
mod pipeline;
mod poller;
mod types;

pub use client::MeshyClient;
pub use config::{
    Config, DEFAULT_MESHY_URL, DEFAULT_OUTPUT_DIR, DEFAULT_PRIMARY_FORMAT, DEFAULT_STABILITY_URL,
};
pub use download::{AssetDownloader, DOWNLOAD_CHUNK_SIZE};
pub use encoder::encode_as_data_uri;
pub use error::{PipelineError, Stage};
pub use generator::{compose_prompt, ImageGenerator, FINISH_REASON_HEADER, STYLE_RULES};
pub use pipeline::{Pipeline, PipelineOutput};
pub use poller::JobPoller;
pub use types::{
    mime_for_extension, ConversionJob, ConversionOptions, DownloadReport, DownloadedAsset,
    GeneratedImage, GenerationRequest, JobStatus, OutputFormat, PollPolicy, SurfaceMode,
    ASPECT_RATIO, IMAGE_MODEL,
};
