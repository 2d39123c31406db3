pub mod backend_client;
pub mod conversation;
pub mod metrics;
pub mod registry;
pub mod session;
pub mod upload;

pub use backend_client::BackendClient;
pub use conversation::{ChatForm, ConversationOrchestrator, PendingTurn};
pub use registry::DocumentRegistry;
pub use session::SessionManager;
pub use upload::UploadCoordinator;
