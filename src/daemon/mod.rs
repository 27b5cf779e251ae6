//! Forever loop driving one generation manager per label.
//!
//! Each label runs its own task; cycles execute on the blocking pool because
//! the builder is a synchronous child process. A failed cycle is followed by
//! an exponential [`Backoff`] sleep, a successful one by the next cycle right
//! away. Shutdown is observed between cycles and during backoff sleeps; a
//! builder already running is waited for.

pub mod backoff;

pub use backoff::Backoff;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::indexer::{GenerationManager, IndexBuilder};

/// Counters reported when a label loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub published: u64,
    pub failed: u64,
}

/// Run cycles for one label until `shutdown` turns true or its sender is dropped.
pub async fn run_label_loop<B>(
    mut manager: GenerationManager<B>,
    mut backoff: Backoff,
    mut shutdown: watch::Receiver<bool>,
) -> Result<LoopStats>
where
    B: IndexBuilder + 'static,
{
    let label = manager.label().name.clone();
    let mut stats = LoopStats::default();

    while !stop_requested(&shutdown) {
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = manager.run_cycle();
            (manager, result)
        })
        .await
        .with_context(|| format!("generation cycle for {label} panicked"))?;
        manager = returned;

        match result {
            Ok(_) => {
                stats.published += 1;
                backoff.reset();
            }
            Err(e) => {
                stats.failed += 1;
                let delay = backoff.next_delay();
                warn!(label = %label, error = %e, retry_in_ms = delay.as_millis() as u64, "cycle_failed");
                let stop = tokio::select! {
                    _ = tokio::time::sleep(delay) => false,
                    changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
                };
                if stop {
                    break;
                }
            }
        }
    }

    info!(label = %label, published = stats.published, failed = stats.failed, "label_loop_stopped");
    Ok(stats)
}

/// A closed channel counts as a stop request.
fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Resolves on SIGINT or, on unix, SIGTERM. A signal that cannot be
/// installed is logged and never fires.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
}

/// Run every manager concurrently until `stop` resolves.
pub async fn run_until<B, F>(managers: Vec<GenerationManager<B>>, backoff: Backoff, stop: F) -> Result<()>
where
    B: IndexBuilder + 'static,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = JoinSet::new();
    for manager in managers {
        tasks.spawn(run_label_loop(manager, backoff.clone(), shutdown_rx.clone()));
    }
    drop(shutdown_rx);

    let listener = tokio::spawn(async move {
        stop.await;
        info!("shutdown requested; finishing current cycles");
        let _ = shutdown_tx.send(true);
    });

    let mut outcome = Ok(());
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined.context("label loop task failed").and_then(|r| r) {
            outcome = Err(e);
            break;
        }
    }
    listener.abort();
    outcome
}

/// Run every manager concurrently until SIGINT or SIGTERM.
pub async fn run_forever<B>(managers: Vec<GenerationManager<B>>, backoff: Backoff) -> Result<()>
where
    B: IndexBuilder + 'static,
{
    run_until(managers, backoff, shutdown_signal()).await
}
