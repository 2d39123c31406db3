#![allow(dead_code)]

use docqa_frontend::config::{
    BackendSettings, LoggingSettings, NotificationSettings, Settings, UploadSettings,
};
use docqa_frontend::models::{LocalFile, LoginForm, Notification};
use docqa_frontend::startup::build_state;
use docqa_frontend::AppState;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TEST_EMAIL: &str = "reader@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";
pub const SESSION_COOKIE: &str = "session=test-session-token; Path=/; HttpOnly";

pub const ALL_PDFS: &str = "/protected/chat/all_pdfs/";
pub const SPECIFIC_PDFS: &str = "/protected/chat/specific_pdfs/";
pub const ONE_PDF_PAGE: &str = "/protected/chat/one_pdf_page/";

pub struct TestApp {
    pub state: AppState,
    pub backend: MockServer,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(UploadSettings::default()).await
    }

    pub async fn spawn_with(upload: UploadSettings) -> Self {
        Self::spawn_configured(upload, 5).await
    }

    /// Backend calls give up after `timeout_secs`.
    pub async fn spawn_with_timeout(timeout_secs: u64) -> Self {
        Self::spawn_configured(UploadSettings::default(), timeout_secs).await
    }

    async fn spawn_configured(upload: UploadSettings, timeout_secs: u64) -> Self {
        let backend = MockServer::start().await;

        let settings = Settings {
            backend: BackendSettings {
                url: format!("{}/", backend.uri()),
                timeout_secs,
            },
            upload,
            // No redirect pauses in tests
            notifications: NotificationSettings {
                login_delay_ms: 0,
                signup_delay_ms: 0,
            },
            logging: LoggingSettings::default(),
        };

        let (state, notifications) =
            build_state(&settings).expect("Failed to build client state");

        Self {
            state,
            backend,
            notifications,
        }
    }

    pub async fn mock_login_success(&self) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", SESSION_COOKIE)
                    .set_body_json(json!({"message": "Login successful"})),
            )
            .mount(&self.backend)
            .await;
    }

    pub async fn login(&self) {
        self.mock_login_success().await;
        self.state
            .login(LoginForm::new(TEST_EMAIL, TEST_PASSWORD))
            .await
            .expect("Login failed");
    }

    pub async fn mock_upload(&self, filenames: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/protected/upload/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "filenames": filenames,
            })))
            .mount(&self.backend)
            .await;
    }

    /// Log in and upload one small PDF per name.
    pub async fn login_with_documents(&self, filenames: &[&str]) {
        self.login().await;
        self.mock_upload(filenames).await;

        let files = filenames.iter().map(|name| pdf(name, 128)).collect();
        self.state
            .upload(files)
            .await
            .expect("Upload failed")
            .expect("Upload was a no-op");
    }

    pub async fn mock_chat(&self, endpoint: &str, result: Value) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&self.backend)
            .await;
    }

    pub async fn requests_to(&self, endpoint: &str) -> Vec<Request> {
        self.backend
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == endpoint)
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.backend
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }
}

pub fn pdf(name: &str, size: usize) -> LocalFile {
    LocalFile::new(name, "application/pdf", vec![b'%'; size])
}

pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("Request body was not JSON")
}

pub fn cookie_header(request: &Request) -> Option<String> {
    request
        .headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
