use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};

/// What the terminal can say about an inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub media_type: String,
    pub size: usize,
}

/// Decode an inline image payload just far enough to describe it.
///
/// Accepts `data:<type>;base64,<payload>` URIs as well as a bare base64 payload,
/// which is reported as `application/octet-stream`.
pub fn summarize_image(payload: &str) -> Result<ImageSummary> {
    let payload = payload.trim();

    let (media_type, encoded) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| anyhow::anyhow!("Malformed data URI: missing ','"))?;
            let media_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| anyhow::anyhow!("Unsupported data URI encoding: {}", header))?;
            let media_type = if media_type.is_empty() {
                "application/octet-stream"
            } else {
                media_type
            };
            (media_type.to_string(), data)
        }
        None => ("application/octet-stream".to_string(), payload),
    };

    let size = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| anyhow::anyhow!("Failed to decode image payload: {}", e))?
        .len();

    Ok(ImageSummary { media_type, size })
}
