use crate::config::BackendSettings;
use crate::middleware::SessionCredentials;
use crate::services::metrics;
use client_core::observability::TracedClientExt;
use client_core::AppError;
use reqwest::{multipart::Form, Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// HTTP client for the question-answering backend.
///
/// The session cookie is attached by the client's cookie store, and every
/// request carries trace context plus a request id.
pub struct BackendClient {
    client: Client,
    base_url: Url,
    credentials: Arc<SessionCredentials>,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, AppError> {
        let base_url = settings.base_url()?;
        let credentials = Arc::new(SessionCredentials::new(&base_url));

        let client = Client::builder()
            .cookie_provider(credentials.clone())
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Send a JSON POST request.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, AppError> {
        let url = self.url(path);
        let started = Instant::now();

        let result = self.client.traced_post(&url).json(body).send().await;

        Self::finish(path, started, result)
    }

    /// Send a multipart POST request.
    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Response, AppError> {
        let url = self.url(path);
        let started = Instant::now();

        let result = self.client.traced_post(&url).multipart(form).send().await;

        Self::finish(path, started, result)
    }

    fn finish(
        path: &str,
        started: Instant,
        result: Result<Response, reqwest::Error>,
    ) -> Result<Response, AppError> {
        match result {
            Ok(response) => {
                let status = response.status();
                metrics::record_request(path, status.as_str(), started.elapsed());
                tracing::debug!(path = %path, status = %status, "Backend responded");
                Ok(response)
            }
            Err(e) => {
                metrics::record_request(path, "error", started.elapsed());
                tracing::error!("Failed to send POST request to {}: {}", path, e);
                Err(AppError::Transport(e))
            }
        }
    }
}

/// Pass successful responses through; anything else becomes `UnexpectedStatus`
/// carrying the response body as text.
pub async fn ensure_success(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::UnexpectedStatus { status, body })
}

/// Decode a JSON body, reporting malformed payloads as `Decode` errors.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
