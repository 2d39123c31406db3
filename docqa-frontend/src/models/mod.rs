pub mod chat;
pub mod document;
pub mod notification;
pub mod user;

pub use chat::{ChatMessage, ChatResult, QueryRequest, QueryScope, Role, SearchMode};
pub use document::{LocalFile, UploadProgress, UploadResponse, UploadStatus};
pub use notification::{Notification, NotificationKind};
pub use user::{LoginForm, Screen, Session, SessionPhase, SignupForm};
