//! A fixed number of workers sharing one shutdown signal.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{error, info};

use super::{Worker, WorkerConfig, WorkerContext};

/// Bounded in-process worker pool.
pub struct WorkerPool {
    workers: Vec<(Arc<Worker>, broadcast::Receiver<()>)>,
    shutdown_tx: broadcast::Sender<()>,
}

impl WorkerPool {
    /// Build `config.concurrency` workers (at least one).
    pub fn new(context: WorkerContext, config: WorkerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let count = config.concurrency.max(1);

        // Receivers are taken now so a shutdown sent before `run` is not lost.
        let workers = (0..count)
            .map(|id| {
                let worker = Arc::new(Worker::new(id, context.clone(), config.clone()));
                (worker, shutdown_tx.subscribe())
            })
            .collect();

        Self {
            workers,
            shutdown_tx,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Sender that stops every worker once they finish their current ticket.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run all workers until shutdown and wait for them to exit.
    pub async fn run(self) {
        info!(workers = self.workers.len(), "Starting worker pool");

        let handles = self
            .workers
            .into_iter()
            .map(|(worker, shutdown_rx)| tokio::spawn(async move { worker.run(shutdown_rx).await }));

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Worker task failed");
            }
        }

        info!("Worker pool stopped");
    }
}
