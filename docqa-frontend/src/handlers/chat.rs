use crate::handlers::ModeArg;
use crate::models::SearchMode;
use crate::utils::render::render_message;
use crate::AppState;
use client_core::AppError;
use tokio::sync::mpsc;

pub fn open(state: &AppState) -> Result<String, AppError> {
    state.open_chat()?;
    Ok("Chat ready. Ask with `ask <question>`.".to_string())
}

pub async fn set_mode(state: &AppState, mode: ModeArg) -> Result<String, AppError> {
    state.ensure_authenticated()?;
    let mode = match mode {
        ModeArg::All => SearchMode::All,
        ModeArg::Subset => SearchMode::Subset,
        ModeArg::Page => SearchMode::Page,
    };
    state.chat_form.lock().await.mode = mode;
    Ok(format!("Search mode: {:?}", mode))
}

pub async fn select(
    state: &AppState,
    names: Vec<String>,
    checked: bool,
) -> Result<String, AppError> {
    state.ensure_authenticated()?;
    let registry = state.registry.get();
    let mut form = state.chat_form.lock().await;

    for name in &names {
        form.set_checked(name, checked, &registry)?;
    }

    let selected: Vec<&str> = form.subset().iter().map(String::as_str).collect();
    Ok(format!("Selected: {}", selected.join(", ")))
}

pub async fn page(
    state: &AppState,
    number: String,
    document: Option<String>,
) -> Result<String, AppError> {
    state.ensure_authenticated()?;
    let registry = state.registry.get();
    let mut form = state.chat_form.lock().await;

    if let Some(document) = document {
        form.select_page_document(&document, &registry)?;
    }
    form.page_number = number;

    Ok(format!(
        "Page search: {} page {}",
        form.page_document(&registry).unwrap_or_default(),
        form.page_number
    ))
}

pub async fn images(state: &AppState, on: bool) -> String {
    state.chat_form.lock().await.image_search = on;
    format!("Image search {}", if on { "on" } else { "off" })
}

/// Queue the question and answer it in the background.
pub async fn ask(
    state: &AppState,
    text: String,
    output: mpsc::UnboundedSender<String>,
) -> Result<String, AppError> {
    state.chat_form.lock().await.draft = text;
    let pending = state.ask().await?;
    let seq = pending.seq();

    let conversation = state.conversation.clone();
    tokio::spawn(async move {
        let reply = conversation.resolve(pending).await;
        let _ = output.send(render_message(&reply));
    });

    Ok(format!("Question #{} sent, waiting for the answer...", seq + 1))
}

pub async fn history(state: &AppState) -> String {
    let messages = state.conversation.messages().await;
    if messages.is_empty() {
        return "No messages yet.".to_string();
    }

    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n\n")
}
