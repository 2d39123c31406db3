//! Upload coordinator: validates a batch, streams it to the backend as one
//! multipart request, and publishes progress while the body is being sent.

use crate::config::UploadSettings;
use crate::models::document::is_allowed_media_type;
use crate::models::{LocalFile, UploadProgress, UploadResponse, UploadStatus};
use crate::services::backend_client::{ensure_success, read_json, BackendClient};
use crate::services::metrics;
use crate::services::registry::DocumentRegistry;
use bytes::Bytes;
use client_core::AppError;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

pub const UPLOAD_PATH: &str = "/protected/upload/";
const FILES_FIELD: &str = "files";
const TRANSPORT_FAILURE: &str = "Upload failed. Please try again.";

/// Reject the batch if any file has a disallowed type or the total is too big.
/// Type is checked before size. Returns the aggregate size.
pub fn validate_batch(files: &[LocalFile], max_batch_bytes: u64) -> Result<u64, AppError> {
    if let Some(file) = files.iter().find(|f| !is_allowed_media_type(&f.media_type)) {
        return Err(AppError::UnsupportedMediaType {
            file_name: file.name.clone(),
            media_type: file.media_type.clone(),
        });
    }

    let total: u64 = files.iter().map(LocalFile::size).sum();
    if total > max_batch_bytes {
        return Err(AppError::BatchTooLarge {
            total,
            limit: max_batch_bytes,
        });
    }

    Ok(total)
}

/// floor(sent * 100 / total), held below 100 until the backend has answered.
pub fn transfer_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = sent.min(total).saturating_mul(100) / total;
    percent.min(99) as u8
}

struct ProgressTracker {
    sent: AtomicU64,
    total: u64,
    progress: Arc<watch::Sender<UploadProgress>>,
}

impl ProgressTracker {
    fn advance(&self, bytes: u64) {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let percent = transfer_percent(sent, self.total);

        self.progress.send_if_modified(|p| {
            if p.status == UploadStatus::Processing && percent > p.percent {
                p.percent = percent;
                true
            } else {
                false
            }
        });
    }
}

fn split_chunks(data: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}

fn file_part(
    file: LocalFile,
    tracker: Arc<ProgressTracker>,
    chunk_size: usize,
) -> Result<Part, AppError> {
    let length = file.size();
    let chunks = split_chunks(file.data, chunk_size);

    let stream = futures::stream::iter(chunks).map(move |chunk| {
        tracker.advance(chunk.len() as u64);
        Ok::<Bytes, std::io::Error>(chunk)
    });

    Ok(Part::stream_with_length(Body::wrap_stream(stream), length)
        .file_name(file.name)
        .mime_str(&file.media_type)?)
}

pub struct UploadCoordinator {
    backend: Arc<BackendClient>,
    registry: Arc<DocumentRegistry>,
    settings: UploadSettings,
    progress: Arc<watch::Sender<UploadProgress>>,
    in_flight: Mutex<()>,
}

impl UploadCoordinator {
    pub fn new(
        backend: Arc<BackendClient>,
        registry: Arc<DocumentRegistry>,
        settings: UploadSettings,
    ) -> Self {
        let (progress, _) = watch::channel(UploadProgress::idle());

        Self {
            backend,
            registry,
            settings,
            progress: Arc::new(progress),
            in_flight: Mutex::new(()),
        }
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    pub fn reset(&self) {
        self.progress.send_replace(UploadProgress::idle());
    }

    /// Upload a batch. An empty selection is a no-op and returns `Ok(None)`.
    /// On success the registry holds exactly the filenames the backend returned,
    /// unless the session ended while the request was in flight.
    pub async fn upload(&self, files: Vec<LocalFile>) -> Result<Option<Vec<String>>, AppError> {
        if files.is_empty() {
            tracing::debug!("No files selected, nothing to upload");
            return Ok(None);
        }

        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| AppError::UploadInProgress)?;

        let total = match validate_batch(&files, self.settings.max_batch_bytes) {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!(error = %err, "Upload batch rejected");
                self.progress.send_replace(UploadProgress::failed(err.to_string()));
                return Err(err);
            }
        };

        self.progress.send_replace(UploadProgress::processing());
        tracing::info!(files = files.len(), bytes = total, "Uploading batch");

        match self.send(files, total).await {
            Ok(filenames) if !self.backend.credentials().is_present() => {
                // Logged out while the batch was in flight
                tracing::warn!(documents = ?filenames, "Session ended during upload, discarding result");
                Err(AppError::NotAuthenticated)
            }
            Ok(filenames) => {
                metrics::record_upload_bytes(total);
                self.registry.set(filenames.clone());
                self.progress.send_replace(UploadProgress::processed());
                tracing::info!(documents = ?filenames, "Upload processed");
                Ok(Some(filenames))
            }
            Err(err) => {
                tracing::error!(error = %err, "Upload failed");
                self.progress
                    .send_replace(UploadProgress::failed(TRANSPORT_FAILURE));
                Err(err)
            }
        }
    }

    async fn send(&self, files: Vec<LocalFile>, total: u64) -> Result<Vec<String>, AppError> {
        let tracker = Arc::new(ProgressTracker {
            sent: AtomicU64::new(0),
            total,
            progress: self.progress.clone(),
        });

        let mut form = Form::new();
        for file in files {
            form = form.part(
                FILES_FIELD,
                file_part(file, tracker.clone(), self.settings.chunk_size)?,
            );
        }

        let response = self.backend.post_multipart(UPLOAD_PATH, form).await?;
        let response = ensure_success(response).await?;
        let body: UploadResponse = read_json(response).await?;

        Ok(body.filenames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    fn pdf(name: &str, size: usize) -> LocalFile {
        LocalFile::new(name, "application/pdf", vec![0u8; size])
    }

    #[test]
    fn accepts_allowed_batch_within_limit() {
        let files = vec![
            pdf("a.pdf", 1024),
            LocalFile::new("talk.mp3", "audio/mpeg", vec![0u8; 2048]),
        ];
        assert_eq!(validate_batch(&files, 20 * MIB as u64).unwrap(), 3072);
    }

    #[test]
    fn rejects_disallowed_type_before_size() {
        let files = vec![
            pdf("a.pdf", 30 * MIB),
            LocalFile::new("notes.txt", "text/plain", vec![0u8; 10]),
        ];
        let err = validate_batch(&files, 20 * MIB as u64).unwrap_err();
        assert!(matches!(
            err,
            AppError::UnsupportedMediaType { ref file_name, .. } if file_name == "notes.txt"
        ));
    }

    #[test]
    fn rejects_oversized_batch() {
        let files = vec![pdf("a.pdf", 7 * MIB), pdf("b.pdf", 7 * MIB), pdf("c.pdf", 7 * MIB)];
        let err = validate_batch(&files, 20 * MIB as u64).unwrap_err();
        assert!(matches!(err, AppError::BatchTooLarge { total, .. } if total == 21 * MIB as u64));
    }

    #[test]
    fn exactly_at_limit_is_allowed() {
        let files = vec![pdf("a.pdf", 20 * MIB)];
        assert!(validate_batch(&files, 20 * MIB as u64).is_ok());
    }

    #[test]
    fn percent_is_floored_and_capped_below_completion() {
        assert_eq!(transfer_percent(0, 200), 0);
        assert_eq!(transfer_percent(1, 200), 0);
        assert_eq!(transfer_percent(3, 200), 1);
        assert_eq!(transfer_percent(199, 200), 99);
        assert_eq!(transfer_percent(200, 200), 99);
        assert_eq!(transfer_percent(10, 0), 0);
    }

    #[test]
    fn chunks_cover_the_whole_file() {
        let chunks = split_chunks(Bytes::from(vec![1u8; 10]), 4);
        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert!(split_chunks(Bytes::new(), 4).is_empty());
    }

    #[test]
    fn tracker_progress_is_monotonic() {
        let (tx, rx) = watch::channel(UploadProgress::processing());
        let tracker = ProgressTracker {
            sent: AtomicU64::new(0),
            total: 100,
            progress: Arc::new(tx),
        };

        let mut seen = Vec::new();
        for step in [10, 15, 0, 50, 25] {
            tracker.advance(step);
            seen.push(rx.borrow().percent);
        }

        assert_eq!(seen, vec![10, 25, 25, 75, 99]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn tracker_ignores_finished_batches() {
        let (tx, rx) = watch::channel(UploadProgress::failed("boom"));
        let tracker = ProgressTracker {
            sent: AtomicU64::new(0),
            total: 10,
            progress: Arc::new(tx),
        };
        tracker.advance(5);
        assert_eq!(rx.borrow().percent, 0);
        assert_eq!(rx.borrow().status, UploadStatus::Failed);
    }
}
