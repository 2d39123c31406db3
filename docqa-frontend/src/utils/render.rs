//! Plain-text rendering for the terminal front end.

use crate::models::{
    ChatMessage, Notification, NotificationKind, Role, UploadProgress, UploadStatus,
};
use crate::utils::media::summarize_image;
use std::fmt::Write as _;

const BAR_WIDTH: usize = 30;

pub fn render_message(message: &ChatMessage) -> String {
    let mut out = String::new();

    match message.role {
        Role::User => {
            let _ = write!(out, "you> {}", message.text.as_deref().unwrap_or_default());
            return out;
        }
        Role::Assistant => out.push_str("assistant>"),
    }

    if let Some(text) = &message.text {
        let _ = write!(out, "\n{}", text);
    }

    if let Some(citations) = &message.citations {
        out.push_str("\n\nSources:");
        for (document, pages) in citations {
            let pages: Vec<String> = pages.iter().map(u32::to_string).collect();
            let _ = write!(out, "\n  - {} (pages {})", document, pages.join(", "));
        }
    }

    if let Some(answer) = &message.image_answer {
        let _ = write!(out, "\n\nFrom images:\n{}", answer);
    }

    if let Some(metadata) = &message.image_metadata {
        let _ = write!(out, "\nImage sources: {}", metadata);
    }

    if let Some(images) = &message.images {
        for (i, payload) in images.iter().enumerate() {
            match summarize_image(payload) {
                Ok(summary) => {
                    let _ = write!(
                        out,
                        "\n  [image {}: {}, {} bytes]",
                        i + 1,
                        summary.media_type,
                        summary.size
                    );
                }
                Err(e) => {
                    let _ = write!(out, "\n  [image {}: unreadable ({})]", i + 1, e);
                }
            }
        }
    }

    out
}

pub fn render_notification(notification: &Notification) -> String {
    let marker = match notification.kind {
        NotificationKind::Success => "+",
        NotificationKind::Error => "!",
    };
    format!("[{}] {}: {}", marker, notification.title, notification.message)
}

pub fn render_progress(progress: &UploadProgress) -> String {
    match progress.status {
        UploadStatus::Idle => "No upload yet".to_string(),
        UploadStatus::Processing => {
            let filled = BAR_WIDTH * usize::from(progress.percent) / 100;
            format!(
                "Processing [{}{}] {}%",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                progress.percent
            )
        }
        UploadStatus::Processed => "Processed".to_string(),
        UploadStatus::Failed => format!(
            "Failed: {}",
            progress.message.as_deref().unwrap_or("unknown error")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ChatResult, Citations, FAILURE_NOTICE};

    #[test]
    fn test_render_assistant_with_citations_and_images() {
        let citations = Citations::from_iter([("report.pdf".to_string(), vec![2, 5])]);

        let message = ChatMessage::from_result(ChatResult {
            text_answer: Some("The revenue grew.".to_string()),
            text_metadata: Some(citations),
            encoded_img: Some(vec!["data:image/jpeg;base64,aGVsbG8=".to_string()]),
            ..Default::default()
        })
        .unwrap();

        let rendered = render_message(&message);
        assert!(rendered.starts_with("assistant>\nThe revenue grew."));
        assert!(rendered.contains("  - report.pdf (pages 2, 5)"));
        assert!(rendered.contains("[image 1: image/jpeg, 5 bytes]"));
        assert!(!rendered.contains("From images"));
    }

    #[test]
    fn test_render_user_and_failure() {
        assert_eq!(render_message(&ChatMessage::user("hi")), "you> hi");
        assert!(render_message(&ChatMessage::failure()).ends_with(FAILURE_NOTICE));
    }

    #[test]
    fn test_render_progress() {
        let progress = UploadProgress {
            percent: 50,
            ..UploadProgress::processing()
        };
        assert_eq!(
            render_progress(&progress),
            format!("Processing [{}{}] 50%", "#".repeat(15), "-".repeat(15))
        );
        assert_eq!(
            render_progress(&UploadProgress::failed("Upload failed. Please try again.")),
            "Failed: Upload failed. Please try again."
        );
    }

    #[test]
    fn test_render_notification() {
        let rendered = render_notification(&Notification::error("Login failed"));
        assert_eq!(rendered, "[!] Error: Login failed");
    }
}
