use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::client::validate_identifier;
use crate::config::Config;
use crate::error::PipelineError;
use crate::types::{ConversionJob, DownloadReport, DownloadedAsset};

/// Size of each write to disk while streaming a download.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// Saves the files produced by a finished conversion job.
#[derive(Clone)]
pub struct AssetDownloader {
    client: reqwest::Client,
    output_dir: PathBuf,
    primary_format: String,
}

impl AssetDownloader {
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        Self::with_output_dir(&config.output_dir, &config.primary_format)
    }

    /// Asset URLs are pre-signed, so this client carries no API key.
    pub fn with_output_dir<P: AsRef<Path>>(
        output_dir: P,
        primary_format: &str,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            output_dir: output_dir.as_ref().to_path_buf(),
            primary_format: primary_format.to_ascii_lowercase(),
        })
    }

    /// Downloads every model file and the thumbnail of a succeeded job.
    ///
    /// Model files are saved as `<job id>.<file type>` and the thumbnail as
    /// `<job id>_thumbnail.png`. File types without a URL are skipped.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Download` if a file URL answers with a non-2xx status.
    /// - `PipelineError::MissingPrimaryAsset` if nothing was downloaded for the
    ///   primary format.
    pub async fn download_assets(
        &self,
        job: &ConversionJob,
    ) -> Result<DownloadReport, PipelineError> {
        let job_id = validate_identifier(&job.id)?;
        fs::create_dir_all(&self.output_dir).await?;

        if job.model_urls.is_empty() {
            warn!(job_id, "no model URLs found in the response");
        }

        let mut assets = Vec::new();
        let mut primary = None;
        for (file_type, url) in &job.model_urls {
            let file_type = validate_identifier(file_type)?;
            let Some(url) = url.as_deref().filter(|url| !url.is_empty()) else {
                warn!(job_id, file_type, "no {} file available", file_type.to_uppercase());
                continue;
            };

            let path = self.output_dir.join(format!("{}.{}", job_id, file_type));
            info!(job_id, file_type, "downloading {} file", file_type.to_uppercase());
            let asset = self.download_file(url, path).await?;

            if file_type.eq_ignore_ascii_case(&self.primary_format) {
                primary = Some(asset.path.clone());
            }
            assets.push(asset);
        }

        let thumbnail = match job.thumbnail_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => {
                let path = self.output_dir.join(format!("{}_thumbnail.png", job_id));
                info!(job_id, "downloading thumbnail image");
                Some(self.download_file(url, path).await?)
            }
            None => None,
        };

        let primary = primary.ok_or_else(|| PipelineError::MissingPrimaryAsset {
            job_id: job_id.to_string(),
            format: self.primary_format.clone(),
        })?;

        Ok(DownloadReport {
            assets,
            thumbnail,
            primary,
        })
    }

    async fn download_file(
        &self,
        url: &str,
        path: PathBuf,
    ) -> Result<DownloadedAsset, PipelineError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::Download {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let file = fs::File::create(&path).await?;
        let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        writer.flush().await?;

        info!(path = %path.display(), bytes, "downloaded");
        Ok(DownloadedAsset {
            path,
            source_url: url.to_string(),
            bytes,
        })
    }
}
