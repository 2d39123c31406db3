use crate::AppState;

pub async fn status(state: &AppState) -> String {
    let registry = state.registry.get();
    let form = state.chat_form.lock().await.clone();

    let user = state
        .session
        .current()
        .map(|s| format!("{} (since {})", s.email, s.started_at.format("%H:%M:%S")))
        .unwrap_or_else(|| "not signed in".to_string());

    let mut out = format!(
        "Screen: {:?}\nPhase: {:?}\nUser: {}\nDocuments: {}",
        state.session.screen(),
        state.phase(),
        user,
        registry.len()
    );
    out.push_str(&format!(
        "\nMode: {:?}\nSubset: [{}]\nPage: {} / {}\nImages: {}\nAwaiting answers: {}",
        form.mode,
        form.subset().iter().cloned().collect::<Vec<_>>().join(", "),
        form.page_document(&registry).unwrap_or_else(|| "-".to_string()),
        if form.page_number.is_empty() { "-" } else { form.page_number.as_str() },
        if form.image_search { "on" } else { "off" },
        state.conversation.pending_count().await,
    ));
    out
}

pub fn metrics() -> String {
    crate::services::metrics::get_metrics()
}
