pub mod catalog;
pub mod config;
pub mod db;
pub mod metrics;
pub mod notify;
pub mod queue;
pub mod runner;
pub mod status;
pub mod testing;
pub mod ticket;
pub mod worker;

pub use catalog::{CatalogError, DatabaseCatalog, DatabaseEntry};
pub use config::{
    config_path, load_config, load_config_from_str, validate_config, Config, ConfigError,
    SanitizedConfig,
};
pub use notify::{
    create_notifier, DispatchResult, Mail, MailConfig, MailTransport, NotificationDispatcher,
    NotificationKind, NotificationTemplates, Notifier, NotifyError,
};
pub use queue::{PendingQueue, QueueError, SqlitePendingQueue};
pub use runner::{ExecutionRunner, Outcome, RunnerConfig};
pub use status::{JobStatus, SqliteStatusStore, StatusEntry, StatusError, StatusStore};
pub use ticket::{
    is_valid_ticket, JobRecord, JobStore, JobStoreError, SubmitRequest, Ticket, TicketError,
    TicketInfo, TicketService,
};
pub use worker::{TickOutcome, Worker, WorkerConfig, WorkerContext, WorkerPool};
