//! Runtime configuration, built once at startup and handed to each component.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::PipelineError;
use crate::types::{ConversionOptions, PollPolicy, SurfaceMode};

pub const DEFAULT_STABILITY_URL: &str = "https://api.stability.ai/";
pub const DEFAULT_MESHY_URL: &str = "https://api.meshy.ai/";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_PRIMARY_FORMAT: &str = "fbx";

#[derive(Debug, Clone)]
pub struct Config {
    pub stability_api_key: String,
    pub meshy_api_key: String,
    pub stability_url: Url,
    pub meshy_url: Url,
    /// Where generated images and downloaded assets are written.
    pub output_dir: PathBuf,
    pub conversion: ConversionOptions,
    pub poll: PollPolicy,
    /// The model file type reported as the run's result.
    pub primary_format: String,
}

impl Config {
    /// Builds a config with default endpoints and options around two API keys.
    pub fn new(stability_api_key: impl Into<String>, meshy_api_key: impl Into<String>) -> Self {
        Self {
            stability_api_key: stability_api_key.into(),
            meshy_api_key: meshy_api_key.into(),
            stability_url: Url::parse(DEFAULT_STABILITY_URL).expect("default URL is valid"),
            meshy_url: Url::parse(DEFAULT_MESHY_URL).expect("default URL is valid"),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            conversion: ConversionOptions::default(),
            poll: PollPolicy::default(),
            primary_format: DEFAULT_PRIMARY_FORMAT.to_string(),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if values should come from a `.env` file.
    ///
    /// # Errors
    ///
    /// - `PipelineError::MissingApiKey` if `STABILITY_KEY` or `MESHY_API_KEY` is unset.
    /// - `PipelineError::InvalidConfig` if an optional variable cannot be parsed.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let stability_api_key =
            get("STABILITY_KEY").ok_or(PipelineError::MissingApiKey("STABILITY_KEY"))?;
        let meshy_api_key =
            get("MESHY_API_KEY").ok_or(PipelineError::MissingApiKey("MESHY_API_KEY"))?;

        let mut config = Self::new(stability_api_key, meshy_api_key);

        if let Some(value) = get("STABILITY_API_URL") {
            config.stability_url = parse_base_url("STABILITY_API_URL", &value)?;
        }
        if let Some(value) = get("MESHY_API_URL") {
            config.meshy_url = parse_base_url("MESHY_API_URL", &value)?;
        }
        if let Some(value) = get("PROMPTMESH_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(value);
        }
        if let Some(value) = get("PROMPTMESH_PRIMARY_FORMAT") {
            config.primary_format = value.trim().to_ascii_lowercase();
        }

        if let Some(value) = get("MESHY_AI_MODEL") {
            config.conversion.ai_model = value;
        }
        if let Some(value) = get("MESHY_ENABLE_PBR") {
            config.conversion.enable_pbr = parse_value("MESHY_ENABLE_PBR", &value)?;
        }
        if let Some(value) = get("MESHY_SURFACE_MODE") {
            let mode = value.trim().to_ascii_lowercase();
            config.conversion.surface_mode = match mode.as_str() {
                "hard" => SurfaceMode::Hard,
                "organic" => SurfaceMode::Organic,
                _ => {
                    return Err(PipelineError::InvalidConfig {
                        key: "MESHY_SURFACE_MODE",
                        value,
                    })
                }
            };
        }

        if let Some(value) = get("MESHY_POLL_INTERVAL_SECS") {
            config.poll.interval =
                Duration::from_secs(parse_value("MESHY_POLL_INTERVAL_SECS", &value)?);
        }
        if let Some(value) = get("MESHY_POLL_MAX_ATTEMPTS") {
            let max_attempts: u32 = parse_value("MESHY_POLL_MAX_ATTEMPTS", &value)?;
            if max_attempts == 0 {
                return Err(PipelineError::InvalidConfig {
                    key: "MESHY_POLL_MAX_ATTEMPTS",
                    value,
                });
            }
            config.poll.max_attempts = Some(max_attempts);
        }
        if let Some(value) = get("MESHY_POLL_TIMEOUT_SECS") {
            config.poll.timeout = Some(Duration::from_secs(parse_value(
                "MESHY_POLL_TIMEOUT_SECS",
                &value,
            )?));
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, PipelineError> {
    value
        .trim()
        .parse()
        .map_err(|_| PipelineError::InvalidConfig {
            key,
            value: value.to_string(),
        })
}

// Relative joins only append when the base path ends in '/'.
fn parse_base_url(key: &'static str, value: &str) -> Result<Url, PipelineError> {
    let trimmed = value.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|_| PipelineError::InvalidConfig {
        key,
        value: value.to_string(),
    })
}
