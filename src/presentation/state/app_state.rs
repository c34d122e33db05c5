use std::sync::Arc;

use crate::application::services::Orchestrator;
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub settings: Settings,
}
