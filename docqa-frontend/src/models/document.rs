use bytes::Bytes;
use client_core::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Media types the backend can ingest. `audio/m4a` is what extension-based
/// guessing reports for `.m4a`, so it is accepted alongside the registered names.
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "audio/mp4",
    "audio/x-m4a",
    "audio/m4a",
    "audio/aac",
];

pub fn is_allowed_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_MEDIA_TYPES.contains(&essence.as_str())
}

/// A file picked for upload, held in memory until the batch is sent.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::InvalidInput(format!("Not a file: {}", path.display())))?
            .to_string();
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let data = tokio::fs::read(path).await?;

        Ok(Self::new(name, media_type, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Idle,
    Processing,
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub status: UploadStatus,
    /// 0..=100, only 100 once the backend has answered.
    pub percent: u8,
    /// Human readable reason when `status` is `Failed`.
    pub message: Option<String>,
}

impl UploadProgress {
    pub fn idle() -> Self {
        Self {
            status: UploadStatus::Idle,
            percent: 0,
            message: None,
        }
    }

    pub fn processing() -> Self {
        Self {
            status: UploadStatus::Processing,
            percent: 0,
            message: None,
        }
    }

    pub fn processed() -> Self {
        Self {
            status: UploadStatus::Processed,
            percent: 100,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: UploadStatus::Failed,
            percent: 0,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filenames: Vec<String>,
}
