pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use client_core::AppError;
use config::Settings;
use models::{LocalFile, LoginForm, Notification, Screen, Session, SessionPhase, SignupForm};
use services::{
    BackendClient, ChatForm, ConversationOrchestrator, DocumentRegistry, PendingTurn,
    SessionManager, UploadCoordinator,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Shared client state: one backend client and the components that sit on it.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub session: Arc<SessionManager>,
    pub registry: Arc<DocumentRegistry>,
    pub uploads: Arc<UploadCoordinator>,
    pub conversation: Arc<ConversationOrchestrator>,
    pub chat_form: Arc<Mutex<ChatForm>>,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> Result<Self, AppError> {
        let backend = Arc::new(BackendClient::new(&settings.backend)?);
        let registry = Arc::new(DocumentRegistry::new());

        Ok(Self {
            session: Arc::new(SessionManager::new(
                backend.clone(),
                notifications,
                settings.notifications.clone(),
            )),
            uploads: Arc::new(UploadCoordinator::new(
                backend.clone(),
                registry.clone(),
                settings.upload.clone(),
            )),
            conversation: Arc::new(ConversationOrchestrator::new(backend.clone())),
            chat_form: Arc::new(Mutex::new(ChatForm::default())),
            registry,
            backend,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.session.is_authenticated() {
            SessionPhase::Anonymous
        } else if self.registry.is_empty() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Ready
        }
    }

    pub fn ensure_authenticated(&self) -> Result<(), AppError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated)
        }
    }

    /// Navigate, dropping every piece of per-user state when the target is public.
    pub async fn navigate(&self, screen: Screen) -> Result<(), AppError> {
        match screen {
            Screen::Landing | Screen::Auth => {
                self.session.navigate(screen);
                self.reset_local().await;
                Ok(())
            }
            Screen::Upload => {
                self.ensure_authenticated()?;
                self.session.navigate(screen);
                Ok(())
            }
            Screen::Chat => self.open_chat(),
        }
    }

    /// Chat is only reachable once a batch has been processed.
    pub fn open_chat(&self) -> Result<(), AppError> {
        self.ensure_authenticated()?;
        if self.registry.is_empty() {
            return Err(AppError::NoDocuments);
        }
        self.session.navigate(Screen::Chat);
        Ok(())
    }

    pub async fn upload(&self, files: Vec<LocalFile>) -> Result<Option<Vec<String>>, AppError> {
        self.ensure_authenticated()?;
        let uploaded = self.uploads.upload(files).await?;

        if uploaded.is_some() {
            let registry = self.registry.get();
            self.chat_form.lock().await.sync_with_registry(&registry);
        }
        Ok(uploaded)
    }

    /// Turn the current draft into a question. The caller resolves the
    /// returned turn, typically on a background task.
    pub async fn ask(&self) -> Result<PendingTurn, AppError> {
        self.ensure_authenticated()?;
        let registry = self.registry.get();
        if registry.is_empty() {
            return Err(AppError::NoDocuments);
        }

        let mut form = self.chat_form.lock().await;
        self.conversation.submit_form(&mut form, &registry).await
    }

    pub async fn login(&self, form: LoginForm) -> Result<Session, AppError> {
        let result = self.session.login(form).await;
        self.settle().await;
        result
    }

    pub async fn signup(&self, form: SignupForm) -> Result<Session, AppError> {
        let result = self.session.signup(form).await;
        self.settle().await;
        result
    }

    /// Log out. Local state goes regardless of what the backend says.
    pub async fn logout(&self) -> Result<(), AppError> {
        let result = self.session.logout().await;
        self.reset_local().await;
        result
    }

    // Authentication attempts may end on a public screen.
    async fn settle(&self) {
        if self.session.screen().is_public() {
            self.reset_local().await;
        }
    }

    async fn reset_local(&self) {
        self.backend.credentials().clear();
        self.registry.clear();
        self.conversation.clear().await;
        self.uploads.reset();
        *self.chat_form.lock().await = ChatForm::default();
    }
}
