use std::sync::Arc;

use crate::config::Config;
use crate::services::events::EventService;
use crate::store::EventStore;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: EventService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EventStore>) -> Self {
        let events = EventService::new(store, config.deadlines);
        Self {
            config: Arc::new(config),
            events,
        }
    }
}
