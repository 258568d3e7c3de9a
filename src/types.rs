use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Aspect ratio requested from the image-generation endpoint.
pub const ASPECT_RATIO: &str = "1:1";

/// The image-generation model.
pub const IMAGE_MODEL: &str = "sd3.5-large-turbo";

/// Image formats the generation endpoint can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// The value sent as `output_format`, which is also the file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

/// A single image-generation request.
///
/// The seed defaults to the current Unix time in seconds, which also makes the
/// output file name unique per run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: &'static str,
    pub seed: u64,
    pub output_format: OutputFormat,
    pub model: &'static str,
    /// Optional init image for image-conditioned generation.
    pub image: Option<PathBuf>,
    /// Optional inpainting mask.
    pub mask: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: ASPECT_RATIO,
            seed: current_seed(),
            output_format: OutputFormat::default(),
            model: IMAGE_MODEL,
            image: None,
            mask: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_mask(mut self, mask: impl Into<PathBuf>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// `generated_<seed>.<ext>`
    pub fn file_name(&self) -> String {
        format!("generated_{}.{}", self.seed, self.output_format.as_str())
    }
}

fn current_seed() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// An image written to local storage by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub seed: u64,
}

impl GeneratedImage {
    pub fn mime_type(&self) -> &'static str {
        mime_for_extension(&self.path)
    }
}

/// Picks a MIME type from the file extension alone.
///
/// `.jpg` and `.jpeg` map to `image/jpeg`; everything else is reported as
/// `image/png`, whatever the real content is.
pub fn mime_for_extension(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

/// Mesh surface treatment requested from the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceMode {
    #[default]
    Hard,
    Organic,
}

/// Options for an image-to-3D job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub enable_pbr: bool,
    pub ai_model: String,
    pub surface_mode: SurfaceMode,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            enable_pbr: true,
            ai_model: "meshy-4".to_string(),
            surface_mode: SurfaceMode::Hard,
        }
    }
}

/// (Internal) The JSON body of a job-creation request.
#[derive(Serialize, Debug)]
pub(crate) struct CreateJobRequest<'a> {
    pub(crate) image_url: &'a str,
    pub(crate) enable_pbr: bool,
    pub(crate) ai_model: &'a str,
    pub(crate) surface_mode: SurfaceMode,
}

/// (Internal) The body of a 202 job-creation response.
#[derive(Deserialize, Debug)]
pub(crate) struct CreateJobResponse {
    pub(crate) result: String,
}

/// Lifecycle state of a conversion job.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum JobStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    Expired,
    /// Any label this crate does not know about, kept verbatim. Treated as
    /// still running.
    Unknown(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Expired
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
            JobStatus::Expired => "EXPIRED",
            JobStatus::Unknown(label) => label,
        }
    }
}

impl From<String> for JobStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "PENDING" => JobStatus::Pending,
            "IN_PROGRESS" => JobStatus::InProgress,
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" => JobStatus::Failed,
            "EXPIRED" => JobStatus::Expired,
            _ => JobStatus::Unknown(label),
        }
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(JobStatus::from)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The status endpoint sends `null` for fields it has nothing for yet.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A snapshot of a conversion job, as returned by the status endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ConversionJob {
    /// The identifier assigned by the service.
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub message: Option<String>,
    /// Completion percentage, when the service reports one.
    #[serde(default)]
    pub progress: Option<u32>,
    /// File type (`fbx`, `glb`, ...) to download URL. Only filled in once the
    /// job has succeeded; individual entries may be null.
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_urls: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// A file fetched from the conversion service's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub path: PathBuf,
    pub source_url: String,
    pub bytes: u64,
}

/// Everything the downloader wrote for one job.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub assets: Vec<DownloadedAsset>,
    pub thumbnail: Option<DownloadedAsset>,
    /// Path of the asset in the configured primary format.
    pub primary: PathBuf,
}

/// How long and how often to wait for a job to finish.
///
/// With no `max_attempts` and no `timeout`, polling continues until the job
/// reaches a terminal state or the status request fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_attempts: None,
            timeout: None,
        }
    }
}
