use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqsearch_core::{
    config_path, create_notifier, load_config, validate_config, Config, DatabaseCatalog,
    ExecutionRunner, JobStore, NotificationDispatcher, Notifier, SqlitePendingQueue,
    SqliteStatusStore, TicketService, WorkerContext, WorkerPool,
};
use seqsearch_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// HTTP submission and status API
    Serve,
    /// Worker pool only
    Worker,
    /// Both in one process
    All,
}

impl Mode {
    fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None | Some("serve") => Ok(Mode::Serve),
            Some("worker") => Ok(Mode::Worker),
            Some("all") => Ok(Mode::All),
            Some(other) => bail!("Unknown mode {:?} (expected serve, worker or all)", other),
        }
    }

    fn runs_http(self) -> bool {
        matches!(self, Mode::Serve | Mode::All)
    }

    fn runs_workers(self) -> bool {
        matches!(self, Mode::Worker | Mode::All)
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let arg = std::env::args().nth(1);
    let mode = Mode::parse(arg.as_deref())?;

    // Load configuration
    let config_path = config_path();
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        mode = ?mode,
        config_hash = &config_hash[..16],
        "Configuration loaded"
    );
    info!("Database path: {:?}", config.database.path);

    // Queue and status share one database file; each store has its own connection
    let queue = Arc::new(
        SqlitePendingQueue::new(&config.database.path, config.database.busy_timeout())
            .context("Failed to open pending queue")?,
    );
    let status = Arc::new(
        SqliteStatusStore::new(&config.database.path, config.database.busy_timeout())
            .context("Failed to open status store")?,
    );
    let job_store = JobStore::new(&config.paths.jobs_base);

    // Everything that can fail at startup happens before any worker starts
    let http = if mode.runs_http() {
        let catalog = load_catalog(&config)?;
        let addr = SocketAddr::new(config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;
        Some((catalog, listener, addr))
    } else {
        None
    };
    let pool = if mode.runs_workers() {
        Some(build_worker_pool(&config, queue.clone(), status.clone(), job_store.clone())?)
    } else {
        None
    };
    let pool_shutdown = pool.as_ref().map(|pool| pool.shutdown_handle());
    let pool_handle = pool.map(|pool| tokio::spawn(pool.run()));

    let served = match http {
        Some((catalog, listener, addr)) => {
            let tickets =
                TicketService::new(job_store, status.clone(), queue.clone()).with_catalog(catalog);
            let state = Arc::new(AppState::new(config.clone(), tickets, queue, status));
            let app = create_router(state);

            info!("Starting server on {}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")
        }
        None => {
            shutdown_signal().await;
            Ok(())
        }
    };

    info!("Shutting down...");

    // Stop workers on every exit path, including a server error
    if let Some(shutdown) = pool_shutdown {
        info!("Waiting for workers to finish their current job");
        // Workers that already exited dropped their receivers
        let _ = shutdown.send(());
    }
    if let Some(handle) = pool_handle {
        if let Err(e) = handle.await {
            error!("Worker pool task failed: {}", e);
        }
    }
    served?;

    info!("Stopped");
    Ok(())
}

fn load_catalog(config: &Config) -> Result<DatabaseCatalog> {
    let catalog = DatabaseCatalog::load(&config.paths.databases)
        .context("Failed to load database catalog")?;
    if catalog.is_empty() {
        bail!(
            "No databases found in {:?} (expected *.params files)",
            config.paths.databases
        );
    }
    info!(databases = catalog.len(), "Database catalog loaded");
    Ok(catalog)
}

fn build_worker_pool(
    config: &Config,
    queue: Arc<SqlitePendingQueue>,
    status: Arc<SqliteStatusStore>,
    job_store: JobStore,
) -> Result<WorkerPool> {
    let notifier: Arc<dyn Notifier> = Arc::from(
        create_notifier(&config.mail).context("Failed to create mail transport")?,
    );
    info!("Using mail transport: {}", notifier.transport_name());

    let dispatcher = NotificationDispatcher::new(
        notifier,
        config.mail.templates.clone(),
        config.mail.sender.clone(),
    );
    let runner = ExecutionRunner::new(config.runner_config(), status.clone());

    let context = WorkerContext {
        queue,
        status,
        job_store,
        runner: Arc::new(runner),
        dispatcher: Arc::new(dispatcher),
    };
    Ok(WorkerPool::new(context, config.worker.clone()))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_serve() {
        assert_eq!(Mode::parse(None).unwrap(), Mode::Serve);
        assert_eq!(Mode::parse(Some("serve")).unwrap(), Mode::Serve);
    }

    #[test]
    fn test_mode_components() {
        let worker = Mode::parse(Some("worker")).unwrap();
        assert!(worker.runs_workers());
        assert!(!worker.runs_http());

        let all = Mode::parse(Some("all")).unwrap();
        assert!(all.runs_workers());
        assert!(all.runs_http());

        assert!(!Mode::Serve.runs_workers());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Mode::parse(Some("both")).is_err());
    }
}
