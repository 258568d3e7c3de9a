use std::path::{Path, PathBuf};

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::multipart;
use tokio::fs;
use tokio_util::codec::{BytesCodec, FramedRead};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::authorized_client;
use crate::config::Config;
use crate::error::PipelineError;
use crate::types::{GeneratedImage, GenerationRequest};

const GENERATE_PATH: &str = "v2beta/stable-image/generate/sd3";

/// Response header carrying the moderation outcome of a generation.
pub const FINISH_REASON_HEADER: &str = "finish-reason";

/// Style rules appended to every user prompt so renders come out consistent.
pub const STYLE_RULES: &str = "


    Rules to be followed while generating the image:
    1.Render the car from a front-top diagonal angle, showcasing the front, one side, and part of the roof.
    2.Use evenly distributed ambient lighting to avoid shadows or reflections that obscure details.
    3.Highlight intricate details such as headlights, tires, and material textures.
    4.Ensure the background is plain and minimalistic, using a solid color or a soft gradient.
    5.Avoid harsh or directional lighting sources that cast prominent shadows or create glares.
    ";

/// Appends [`STYLE_RULES`] to the prompt typed by the user.
pub fn compose_prompt(user_prompt: &str) -> String {
    format!("{}{}", user_prompt, STYLE_RULES)
}

/// Client for the Stability AI image-generation endpoint.
#[derive(Clone)]
pub struct ImageGenerator {
    client: reqwest::Client,
    endpoint: Url,
    output_dir: PathBuf,
}

impl ImageGenerator {
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        Self::new_with_url(
            &config.stability_api_key,
            config.stability_url.as_str(),
            &config.output_dir,
        )
    }

    /// Creates a generator against a custom base URL, e.g. a mock server.
    pub fn new_with_url<P: AsRef<Path>>(
        api_key: &str,
        base_url: &str,
        output_dir: P,
    ) -> Result<Self, PipelineError> {
        let client = authorized_client(api_key)?;
        let endpoint = Url::parse(base_url)?.join(GENERATE_PATH)?;

        Ok(Self {
            client,
            endpoint,
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    /// Generates an image for a user prompt, with the style rules appended
    /// and a seed taken from the current time.
    pub async fn generate_image(&self, user_prompt: &str) -> Result<GeneratedImage, PipelineError> {
        let request = GenerationRequest::new(compose_prompt(user_prompt));
        self.generate(&request).await
    }

    /// Sends a prepared request and writes the returned image to the output
    /// directory as `generated_<seed>.<ext>`.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Request` if the endpoint answers with a non-2xx status.
    /// - `PipelineError::ContentFiltered` if the moderation filter rejected the image.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, PipelineError> {
        let form = build_form(request).await?;

        info!(endpoint = %self.endpoint, seed = request.seed, "sending image generation request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, HeaderValue::from_static("image/*"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Request {
                status: status.as_u16(),
                body,
            });
        }

        let finish_reason = response
            .headers()
            .get(FINISH_REASON_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        debug!(?finish_reason, "image generation finished");
        if finish_reason.as_deref() == Some("CONTENT_FILTERED") {
            warn!(seed = request.seed, "generated image was filtered by moderation");
            return Err(PipelineError::ContentFiltered);
        }

        let bytes = response.bytes().await?;

        fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(request.file_name());
        fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "image saved");

        Ok(GeneratedImage {
            path,
            seed: request.seed,
        })
    }
}

async fn build_form(request: &GenerationRequest) -> Result<multipart::Form, PipelineError> {
    let mut form = multipart::Form::new()
        .text("prompt", request.prompt.clone())
        .text("aspect_ratio", request.aspect_ratio)
        .text("seed", request.seed.to_string())
        .text("output_format", request.output_format.as_str())
        .text("model", request.model);

    let mut has_file = false;
    if let Some(image) = &request.image {
        form = form.part("image", file_part(image).await?);
        has_file = true;
    }
    if let Some(mask) = &request.mask {
        form = form.part("mask", file_part(mask).await?);
        has_file = true;
    }
    // The endpoint expects at least one file field.
    if !has_file {
        form = form.text("none", "");
    }

    Ok(form)
}

async fn file_part(path: &Path) -> Result<multipart::Part, PipelineError> {
    let file = fs::File::open(path).await?;
    let stream = FramedRead::new(file, BytesCodec::new());
    let body = reqwest::Body::wrap_stream(stream);

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PipelineError::InvalidIdentifier(path.display().to_string()))?
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    Ok(multipart::Part::stream(body)
        .file_name(file_name)
        .mime_str(&mime_type)?)
}
