use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::{error, info};
use url::Url;

use crate::config::Config;
use crate::error::PipelineError;
use crate::types::{ConversionJob, ConversionOptions, CreateJobRequest, CreateJobResponse};

const IMAGE_TO_3D_PATH: &str = "v1/image-to-3d";

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Builds a `reqwest::Client` that sends `Authorization: Bearer <api_key>` on
/// every request.
pub(crate) fn authorized_client(api_key: &str) -> Result<reqwest::Client, PipelineError> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|_| PipelineError::InvalidApiKey)?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .build()?)
}

/// Checks that a service-assigned value is safe to use as a URL segment or
/// file name component.
pub(crate) fn validate_identifier(value: &str) -> Result<&str, PipelineError> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(value)
    } else {
        Err(PipelineError::InvalidIdentifier(value.to_string()))
    }
}

/// Client for the Meshy image-to-3D API.
///
/// It holds a `reqwest::Client` carrying the API key and the base URL for all
/// requests. Cloning is cheap.
#[derive(Clone)]
pub struct MeshyClient {
    client: reqwest::Client,
    base_url: Url,
}

impl MeshyClient {
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        Self::new_with_url(&config.meshy_api_key, config.meshy_url.as_str())
    }

    /// Creates a client with a custom base URL.
    ///
    /// This is useful for testing or for connecting to a different API endpoint.
    ///
    /// # Errors
    ///
    /// - `PipelineError::InvalidApiKey` if the key cannot be sent as a header.
    /// - `PipelineError::RequestFailed` if the internal HTTP client fails to build.
    /// - `PipelineError::UrlParseFailed` if the provided `base_url` is invalid.
    pub fn new_with_url(api_key: &str, base_url: &str) -> Result<Self, PipelineError> {
        let client = authorized_client(api_key)?;
        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Submits an image-to-3D job for an image passed as a data URI.
    ///
    /// Only `202 Accepted` counts as success.
    ///
    /// # Returns
    ///
    /// The identifier of the new job, taken from the `result` field.
    pub async fn create_job(
        &self,
        image_data_uri: &str,
        options: &ConversionOptions,
    ) -> Result<String, PipelineError> {
        let url = self.base_url.join(IMAGE_TO_3D_PATH)?;
        let request_body = CreateJobRequest {
            image_url: image_data_uri,
            enable_pbr: options.enable_pbr,
            ai_model: &options.ai_model,
            surface_mode: options.surface_mode,
        };

        let response = self.client.post(url).json(&request_body).send().await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            let created: CreateJobResponse = response.json().await?;
            info!(job_id = %created.result, "task created successfully");
            Ok(created.result)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "failed to create task");
            Err(PipelineError::JobCreation {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Fetches the current state of a job.
    ///
    /// Only `200 OK` counts as success.
    pub async fn get_job(&self, job_id: &str) -> Result<ConversionJob, PipelineError> {
        let job_id = validate_identifier(job_id)?;
        let url = self
            .base_url
            .join(&format!("{}/{}", IMAGE_TO_3D_PATH, job_id))?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::OK {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(job_id, status = status.as_u16(), %body, "failed to fetch task status");
            Err(PipelineError::JobStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}
