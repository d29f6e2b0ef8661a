pub mod ai;
pub mod config;
pub mod doctor;
pub mod models;
pub mod rest;
pub mod store;

use std::sync::Arc;

use ai::ReasoningClient;
use config::AgencyConfig;
use store::StoreBackend;

/// Shared application state passed to every request handler.
///
/// Both external clients are constructed once at process start; there are
/// no module-level singletons.
pub struct AppContext {
    pub config: Arc<AgencyConfig>,
    /// External relational store (hosted; the server caches nothing).
    pub store: Arc<dyn StoreBackend>,
    /// Hosted chat-completions client for the two AI endpoints.
    pub reasoning: Arc<ReasoningClient>,
    pub started_at: std::time::Instant,
}
