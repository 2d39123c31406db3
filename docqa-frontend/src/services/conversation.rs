//! Conversation orchestration.
//!
//! A turn is committed in two phases: `begin` appends the user's message right
//! away and hands back a `PendingTurn`; `resolve` calls the backend and attaches
//! the assistant's reply to that same turn. Turns carry a sequence number, so a
//! reply always lands after its own question whatever order the backend answers in.

use crate::models::chat::{parse_page_number, ChatResponse};
use crate::models::{ChatMessage, QueryRequest, QueryScope, SearchMode};
use crate::services::backend_client::{ensure_success, read_json, BackendClient};
use client_core::AppError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle for a question whose answer has not arrived yet.
#[derive(Debug)]
pub struct PendingTurn {
    seq: u64,
    request: QueryRequest,
}

impl PendingTurn {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }
}

#[derive(Debug)]
struct Turn {
    seq: u64,
    question: ChatMessage,
    reply: Option<ChatMessage>,
}

#[derive(Debug, Default)]
struct Transcript {
    next_seq: u64,
    turns: Vec<Turn>,
}

pub struct ConversationOrchestrator {
    backend: Arc<BackendClient>,
    transcript: Mutex<Transcript>,
}

impl ConversationOrchestrator {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self {
            backend,
            transcript: Mutex::new(Transcript::default()),
        }
    }

    /// Phase one: record the user's message and reserve a slot for the reply.
    pub async fn begin(&self, request: QueryRequest) -> PendingTurn {
        let mut transcript = self.transcript.lock().await;
        let seq = transcript.next_seq;
        transcript.next_seq += 1;
        transcript.turns.push(Turn {
            seq,
            question: ChatMessage::user(&request.query),
            reply: None,
        });

        tracing::debug!(seq, endpoint = request.endpoint(), "Question queued");
        PendingTurn { seq, request }
    }

    /// Phase two: ask the backend and attach the reply to the pending turn.
    /// Failures become the fixed failure notice; this never errors.
    pub async fn resolve(&self, pending: PendingTurn) -> ChatMessage {
        let reply = match self.ask(&pending.request).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(seq = pending.seq, error = %e, "Chat request failed");
                ChatMessage::failure()
            }
        };

        let mut transcript = self.transcript.lock().await;
        match transcript.turns.iter_mut().find(|t| t.seq == pending.seq) {
            Some(turn) => turn.reply = Some(reply.clone()),
            // Transcript was cleared (logout) while the request was in flight
            None => tracing::debug!(seq = pending.seq, "Dropping reply for discarded turn"),
        }

        reply
    }

    /// Validate, append the question, and wait for the answer.
    pub async fn submit(
        &self,
        query: &str,
        scope: QueryScope,
        image_search: bool,
    ) -> Result<ChatMessage, AppError> {
        let request = QueryRequest::new(query, scope, image_search)?;
        let pending = self.begin(request).await;
        Ok(self.resolve(pending).await)
    }

    /// Validate the form and start a turn from it. The draft is cleared once the
    /// question is dispatched; the caller decides when to `resolve`.
    pub async fn submit_form(
        &self,
        form: &mut ChatForm,
        registry: &[String],
    ) -> Result<PendingTurn, AppError> {
        let request = form.prepare(registry)?;
        let pending = self.begin(request).await;
        form.draft.clear();
        Ok(pending)
    }

    async fn ask(&self, request: &QueryRequest) -> Result<ChatMessage, AppError> {
        let response = self
            .backend
            .post_json(request.endpoint(), request)
            .await?;
        let response = ensure_success(response).await?;
        let body: ChatResponse = read_json(response).await?;

        Ok(ChatMessage::from_result(body.result).unwrap_or_else(|| {
            tracing::warn!("Backend answered with an empty result");
            ChatMessage::failure()
        }))
    }

    /// The transcript in display order: each question followed by its reply,
    /// when one has arrived.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        let transcript = self.transcript.lock().await;
        transcript
            .turns
            .iter()
            .flat_map(|turn| std::iter::once(&turn.question).chain(turn.reply.as_ref()))
            .cloned()
            .collect()
    }

    pub async fn pending_count(&self) -> usize {
        let transcript = self.transcript.lock().await;
        transcript.turns.iter().filter(|t| t.reply.is_none()).count()
    }

    pub async fn clear(&self) {
        self.transcript.lock().await.turns.clear();
    }
}

/// Chat input and the search options next to it.
#[derive(Debug, Clone, Default)]
pub struct ChatForm {
    pub draft: String,
    pub mode: SearchMode,
    pub image_search: bool,
    /// Raw page-number field; parsed on submit.
    pub page_number: String,
    subset: BTreeSet<String>,
    page_document: Option<String>,
}

impl ChatForm {
    pub fn subset(&self) -> &BTreeSet<String> {
        &self.subset
    }

    /// Check or uncheck a document for subset search.
    pub fn set_checked(
        &mut self,
        name: &str,
        checked: bool,
        registry: &[String],
    ) -> Result<(), AppError> {
        ensure_known(name, registry)?;
        if checked {
            self.subset.insert(name.to_string());
        } else {
            self.subset.remove(name);
        }
        Ok(())
    }

    /// Flip a document's checkbox; returns the new state.
    pub fn toggle(&mut self, name: &str, registry: &[String]) -> Result<bool, AppError> {
        let checked = !self.subset.contains(name);
        self.set_checked(name, checked, registry)?;
        Ok(checked)
    }

    pub fn select_page_document(&mut self, name: &str, registry: &[String]) -> Result<(), AppError> {
        ensure_known(name, registry)?;
        self.page_document = Some(name.to_string());
        Ok(())
    }

    /// The document picked for page search, defaulting to the first one listed.
    pub fn page_document(&self, registry: &[String]) -> Option<String> {
        self.page_document
            .clone()
            .filter(|name| registry.contains(name))
            .or_else(|| registry.first().cloned())
    }

    /// Drop selections that no longer exist after the registry was replaced.
    pub fn sync_with_registry(&mut self, registry: &[String]) {
        self.subset.retain(|name| registry.contains(name));
        if let Some(name) = &self.page_document {
            if !registry.contains(name) {
                self.page_document = None;
            }
        }
    }

    pub fn scope(&self, registry: &[String]) -> Result<QueryScope, AppError> {
        match self.mode {
            SearchMode::All => Ok(QueryScope::All),
            SearchMode::Subset => Ok(QueryScope::Subset {
                pdf_names: self
                    .subset
                    .iter()
                    .filter(|name| registry.contains(name))
                    .cloned()
                    .collect(),
            }),
            SearchMode::Page => {
                let pdf_name = self
                    .page_document(registry)
                    .ok_or_else(|| AppError::InvalidInput("Select a document".to_string()))?;
                let page_number = parse_page_number(&self.page_number)?;
                Ok(QueryScope::Page {
                    pdf_name,
                    page_number,
                })
            }
        }
    }

    /// Build the request for the current draft without touching the form.
    pub fn prepare(&self, registry: &[String]) -> Result<QueryRequest, AppError> {
        let scope = self.scope(registry)?;
        QueryRequest::new(self.draft.clone(), scope, self.image_search)
    }
}

fn ensure_known(name: &str, registry: &[String]) -> Result<(), AppError> {
    if registry.iter().any(|f| f == name) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("Unknown document: {}", name)))
    }
}
