use std::sync::Arc;

use mei_core::MeiRepository;
use mei_core::calculations::{BracketTable, QuotaGate};

use crate::config::AuthConfig;

/// Shared by every request. The bracket table and quota gate are fixed at
/// startup; only the repository holds mutable state.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn MeiRepository>,
    pub brackets: Arc<BracketTable>,
    pub quota: QuotaGate,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn MeiRepository>,
        brackets: BracketTable,
        quota: QuotaGate,
        auth: AuthConfig,
    ) -> Self {
        Self {
            repo,
            brackets: Arc::new(brackets),
            quota,
            auth: Arc::new(auth),
        }
    }
}
