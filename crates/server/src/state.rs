use std::sync::Arc;

use seqsearch_core::{
    Config, DatabaseEntry, PendingQueue, SanitizedConfig, StatusStore, TicketService,
};

/// Shared application state
pub struct AppState {
    config: Config,
    tickets: TicketService,
    queue: Arc<dyn PendingQueue>,
    status: Arc<dyn StatusStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        tickets: TicketService,
        queue: Arc<dyn PendingQueue>,
        status: Arc<dyn StatusStore>,
    ) -> Self {
        Self {
            config,
            tickets,
            queue,
            status,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn tickets(&self) -> &TicketService {
        &self.tickets
    }

    /// Databases offered to clients, in display order.
    pub fn databases(&self) -> &[DatabaseEntry] {
        self.tickets
            .catalog()
            .map(|catalog| catalog.entries())
            .unwrap_or_default()
    }

    pub fn queue(&self) -> &dyn PendingQueue {
        self.queue.as_ref()
    }

    pub fn status_store(&self) -> &dyn StatusStore {
        self.status.as_ref()
    }
}
