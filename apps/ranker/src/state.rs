use std::sync::Arc;

use crate::config::Config;
use crate::documents::DocumentProcessor;
use crate::ranking::completion::Completion;
use crate::ranking::name_policy::NamePolicy;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds only immutable collaborators; every request builds its own pipeline state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Production: `LlmClient`. Tests swap in a scripted fake.
    pub completion: Arc<dyn Completion>,
    pub documents: Arc<dyn DocumentProcessor>,
    pub name_policy: Arc<NamePolicy>,
}
