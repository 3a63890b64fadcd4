use safee::agent::Agent;
use std::sync::Arc;

/// Shared application state: the agent is built once at startup and shared
/// by every request.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
}
