use chrono::{DateTime, Utc};
use client_core::AppError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;

/// Shown as the assistant's reply when a question could not be answered.
pub const FAILURE_NOTICE: &str =
    "Sorry, something went wrong while answering your question. Please try again.";

/// Document name -> cited page numbers, in the order the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citations(Vec<(String, Vec<u32>)>);

impl Citations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, document: &str) -> Option<&[u32]> {
        self.0
            .iter()
            .find(|(name, _)| name == document)
            .map(|(_, pages)| pages.as_slice())
    }

    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

impl<'a> IntoIterator for &'a Citations {
    type Item = &'a (String, Vec<u32>);
    type IntoIter = std::slice::Iter<'a, (String, Vec<u32>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Vec<u32>)> for Citations {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u32>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Citations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (document, pages) in &self.0 {
            map.serialize_entry(document, pages)?;
        }
        map.end()
    }
}

struct CitationsVisitor;

impl<'de> Visitor<'de> for CitationsVisitor {
    type Value = Citations;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of document names to page numbers")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((document, pages)) = access.next_entry::<String, Vec<u32>>()? {
            entries.push((document, pages));
        }
        Ok(Citations(entries))
    }
}

impl<'de> Deserialize<'de> for Citations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CitationsVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Citations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: Some(text.into()),
            citations: None,
            image_answer: None,
            image_metadata: None,
            images: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure() -> Self {
        Self {
            role: Role::Assistant,
            text: Some(FAILURE_NOTICE.to_string()),
            citations: None,
            image_answer: None,
            image_metadata: None,
            images: None,
            created_at: Utc::now(),
        }
    }

    /// Map a backend answer to an assistant message. Empty fields are dropped;
    /// `None` when nothing is left to show.
    pub fn from_result(result: ChatResult) -> Option<Self> {
        let message = Self {
            role: Role::Assistant,
            text: result.text_answer.filter(|s| !s.trim().is_empty()),
            citations: result.text_metadata.filter(|m| !m.is_empty()),
            image_answer: result.img_answer.filter(|s| !s.trim().is_empty()),
            image_metadata: result
                .img_metadata
                .filter(|v| !v.is_null() && v != &serde_json::json!({}) && v != &serde_json::json!([])),
            images: result.encoded_img.filter(|imgs| !imgs.is_empty()),
            created_at: Utc::now(),
        };

        if message.text.is_none()
            && message.citations.is_none()
            && message.image_answer.is_none()
            && message.image_metadata.is_none()
            && message.images.is_none()
        {
            return None;
        }
        Some(message)
    }

    pub fn is_failure(&self) -> bool {
        self.role == Role::Assistant && self.text.as_deref() == Some(FAILURE_NOTICE)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub result: ChatResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResult {
    #[serde(default)]
    pub text_answer: Option<String>,
    #[serde(default)]
    pub text_metadata: Option<Citations>,
    #[serde(default)]
    pub img_answer: Option<String>,
    #[serde(default)]
    pub img_metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub encoded_img: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    All,
    Subset,
    Page,
}

/// Which documents a question is asked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    All,
    Subset { pdf_names: Vec<String> },
    Page { pdf_name: String, page_number: NonZeroU32 },
}

impl QueryScope {
    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryScope::All => "/protected/chat/all_pdfs/",
            QueryScope::Subset { .. } => "/protected/chat/specific_pdfs/",
            QueryScope::Page { .. } => "/protected/chat/one_pdf_page/",
        }
    }

    pub fn mode(&self) -> SearchMode {
        match self {
            QueryScope::All => SearchMode::All,
            QueryScope::Subset { .. } => SearchMode::Subset,
            QueryScope::Page { .. } => SearchMode::Page,
        }
    }
}

/// Parse the page-number field. Anything but a positive integer is rejected.
pub fn parse_page_number(raw: &str) -> Result<NonZeroU32, AppError> {
    raw.trim()
        .parse::<NonZeroU32>()
        .map_err(|_| AppError::InvalidInput(format!("Page number must be a positive integer, got '{}'", raw.trim())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub image_switch: bool,
    pub scope: QueryScope,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, scope: QueryScope, image_switch: bool) -> Result<Self, AppError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Enter a message".to_string()));
        }
        if let QueryScope::Subset { pdf_names } = &scope {
            if pdf_names.is_empty() {
                return Err(AppError::InvalidInput(
                    "Select at least one document".to_string(),
                ));
            }
        }

        Ok(Self {
            query,
            image_switch,
            scope,
        })
    }

    pub fn endpoint(&self) -> &'static str {
        self.scope.endpoint()
    }
}

impl Serialize for QueryRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let scope_fields = match &self.scope {
            QueryScope::All => 0,
            QueryScope::Subset { .. } => 1,
            QueryScope::Page { .. } => 2,
        };

        let mut map = serializer.serialize_map(Some(2 + scope_fields))?;
        map.serialize_entry("query", &self.query)?;
        map.serialize_entry("image_switch", &self.image_switch)?;
        match &self.scope {
            QueryScope::All => {}
            QueryScope::Subset { pdf_names } => {
                map.serialize_entry("pdf_names", pdf_names)?;
            }
            QueryScope::Page {
                pdf_name,
                page_number,
            } => {
                map.serialize_entry("pdf_name", pdf_name)?;
                map.serialize_entry("page_number", &page_number.get())?;
            }
        }
        map.end()
    }
}
