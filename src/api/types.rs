//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::core_state::CoreState;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Opaque identifier of the form `<prefix>_<unix millis>`.
/// Not unique under concurrent requests within the same millisecond.
pub fn timestamp_id(prefix: &str) -> String {
    format!("{prefix}_{}", chrono::Utc::now().timestamp_millis())
}
