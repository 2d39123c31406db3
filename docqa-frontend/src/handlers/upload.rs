use crate::models::LocalFile;
use crate::utils::render::render_progress;
use crate::AppState;
use client_core::AppError;
use std::path::PathBuf;

pub async fn upload(state: &AppState, paths: Vec<PathBuf>) -> Result<String, AppError> {
    state.ensure_authenticated()?;

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(LocalFile::from_path(path).await?);
    }

    match state.upload(files).await? {
        Some(filenames) => Ok(format!(
            "Processed {} document(s): {}\nRun `chat` to start asking questions.",
            filenames.len(),
            filenames.join(", ")
        )),
        None => Ok("No files selected.".to_string()),
    }
}

pub fn docs(state: &AppState) -> String {
    let registry = state.registry.get();
    let mut out = format!("Upload: {}", render_progress(&state.uploads.progress()));

    if registry.is_empty() {
        out.push_str("\nNo documents uploaded.");
    } else {
        for (i, name) in registry.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", i + 1, name));
        }
    }
    out
}
