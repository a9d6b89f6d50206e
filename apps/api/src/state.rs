use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Config;
use crate::store::RoutineStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once at startup; handlers only read from it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoutineStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}
