use crate::config::NotificationSettings;
use crate::models::{LoginForm, Notification, Screen, Session, SignupForm};
use crate::services::backend_client::{ensure_success, BackendClient};
use client_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use validator::Validate;

/// Tracks whether the user is signed in and which screen they are on.
///
/// Login and signup show a notification, hold it for the configured delay,
/// then navigate: login success goes to Upload, everything else back to Landing.
pub struct SessionManager {
    backend: Arc<BackendClient>,
    session: watch::Sender<Option<Session>>,
    screen: watch::Sender<Screen>,
    notifications: mpsc::UnboundedSender<Notification>,
    delays: NotificationSettings,
}

impl SessionManager {
    pub fn new(
        backend: Arc<BackendClient>,
        notifications: mpsc::UnboundedSender<Notification>,
        delays: NotificationSettings,
    ) -> Self {
        let (session, _) = watch::channel(None);
        let (screen, _) = watch::channel(Screen::Landing);

        Self {
            backend,
            session,
            screen,
            notifications,
            delays,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn current(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub fn screen(&self) -> Screen {
        *self.screen.borrow()
    }

    pub fn subscribe_screen(&self) -> watch::Receiver<Screen> {
        self.screen.subscribe()
    }

    /// Move to `screen`. Public screens end the session.
    pub fn navigate(&self, screen: Screen) {
        if screen.is_public() && self.is_authenticated() {
            tracing::info!("Leaving authenticated area, dropping session");
        }
        if screen.is_public() {
            self.invalidate();
        }

        let previous = self.screen.send_replace(screen);
        if previous != screen {
            tracing::debug!(from = ?previous, to = ?screen, "Navigated");
        }
    }

    fn invalidate(&self) {
        self.backend.credentials().clear();
        self.session.send_replace(None);
    }

    pub async fn login(&self, form: LoginForm) -> Result<Session, AppError> {
        form.validate()?;

        match self.authenticate("/login", &form.payload(), "Login failed").await {
            Ok(()) => {
                let session = Session::new(&form.email_id);
                self.session.send_replace(Some(session.clone()));
                tracing::info!(email = %form.email_id, "User logged in successfully");

                self.notify(Notification::success("Login successful! Redirecting..."));
                self.redirect_after(self.delays.login_delay(), Screen::Upload)
                    .await;
                Ok(session)
            }
            Err(err) => {
                self.notify(Notification::error(err.to_string()));
                self.redirect_after(self.delays.login_delay(), Screen::Landing)
                    .await;
                Err(err)
            }
        }
    }

    pub async fn signup(&self, form: SignupForm) -> Result<Session, AppError> {
        form.validate()?;

        match self
            .authenticate("/register/user", &form.payload(), "Signup failed")
            .await
        {
            Ok(()) => {
                let session = Session::new(&form.email_id);
                self.session.send_replace(Some(session.clone()));
                tracing::info!(email = %form.email_id, "User registered successfully");

                self.notify(Notification::success("Signup successful! Redirecting..."));
                self.redirect_after(self.delays.signup_delay(), Screen::Landing)
                    .await;
                Ok(session)
            }
            Err(err) => {
                self.notify(Notification::error(err.to_string()));
                self.redirect_after(self.delays.signup_delay(), Screen::Landing)
                    .await;
                Err(err)
            }
        }
    }

    /// End the session on the backend. Local state is cleared even when the
    /// backend call fails; the failure is still returned.
    pub async fn logout(&self) -> Result<(), AppError> {
        let result = match self
            .backend
            .post_json("/protected/logout/", &serde_json::json!({}))
            .await
        {
            Ok(response) => ensure_success(response).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => tracing::info!("Logged out"),
            Err(e) => tracing::error!("Failed to end backend session during logout: {}", e),
        }

        self.navigate(Screen::Landing);
        result
    }

    async fn authenticate<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
        fallback: &str,
    ) -> Result<(), AppError> {
        let response = match self.backend.post_json(path, payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Authentication request failed");
                return Err(AppError::Auth(fallback.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(path = %path, status = %status, "Backend rejected credentials");
        Err(AppError::Auth(backend_message(&body).unwrap_or_else(|| fallback.to_string())))
    }

    async fn redirect_after(&self, delay: Duration, screen: Screen) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.navigate(screen);
    }

    fn notify(&self, notification: Notification) {
        // Nobody listening is fine; notifications are best effort.
        let _ = self.notifications.send(notification);
    }
}

/// The backend's error payload as shown to the user: a bare JSON string is
/// unquoted, anything else is passed through untouched.
fn backend_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) => Some(s),
        _ => Some(trimmed.to_string()),
    }
}
