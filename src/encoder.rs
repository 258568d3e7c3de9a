use std::path::Path;

use base64::prelude::*;
use tracing::error;

use crate::error::PipelineError;
use crate::types::mime_for_extension;

/// Reads an image and returns it as a `data:<mime>;base64,<payload>` URI.
///
/// The MIME type is chosen from the extension only, see [`mime_for_extension`].
pub async fn encode_as_data_uri<P: AsRef<Path>>(path: P) -> Result<String, PipelineError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| {
        error!(path = %path.display(), %source, "error encoding image");
        PipelineError::Encode {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let payload = BASE64_STANDARD.encode(&bytes);
    Ok(format!(
        "data:{};base64,{}",
        mime_for_extension(path),
        payload
    ))
}
