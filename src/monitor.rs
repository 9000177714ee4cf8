//! The long-running reconcile loop.
//!
//! A [`Monitor`] owns the telemetry [`Subscription`] and the [`Reconciler`]
//! inside one task. Deliveries and liveness deadlines are handled by the
//! same `select!`, so a late delivery and an expiring deadline can never
//! race each other. [`Monitor::shutdown`] stops the task and releases the
//! subscription; no deadline fires after it returns.

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::reconciler::{DashboardView, Reconciler};
use crate::source::{Delivery, Subscription};

/// Handle to a running reconcile loop.
#[derive(Debug)]
pub struct Monitor {
    view: watch::Receiver<DashboardView>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Monitor {
    /// Start reconciling deliveries from `subscription`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(subscription: Subscription, reconciler: Reconciler) -> Self {
        let view = reconciler.subscribe();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(subscription, reconciler, shutdown_rx));

        Self {
            view,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// A receiver for the derived view.
    pub fn view(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }

    /// Whether the loop has stopped (shutdown or source exhausted).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and release the subscription.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Monitor task ended abnormally: {}", e);
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut subscription: Subscription,
    mut reconciler: Reconciler,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!("Monitoring {}", subscription.description());

    loop {
        let deadline = reconciler.deadline();

        tokio::select! {
            biased;

            _ = &mut shutdown => {
                debug!("Monitor shutting down");
                break;
            }

            delivery = subscription.recv() => match delivery {
                Some(delivery) => reconciler.on_snapshot(delivery, Instant::now(), Utc::now()),
                None => {
                    info!("Telemetry source finished");
                    if reconciler.current().is_some() || reconciler.is_online() {
                        reconciler.on_snapshot(Delivery::Absent, Instant::now(), Utc::now());
                    }
                    break;
                }
            },

            _ = expiry(deadline) => reconciler.on_deadline(Instant::now()),
        }
    }

    subscription.unsubscribe();
    info!("Unsubscribed from telemetry source");
}

async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
