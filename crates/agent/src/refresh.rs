//! Periodic snapshot reload

use std::sync::Arc;
use std::time::Duration;

use capacity_lib::{load_snapshots, CapacityReport, SnapshotSource};
use chrono::Utc;
use tokio::sync::watch;
use tokio::time;

use crate::api::AppState;

/// Reload every snapshot source once and publish the evaluated report
///
/// A source that fails keeps serving its last good snapshot; only its error
/// is replaced.
pub async fn refresh_once(state: &AppState, source: &dyn SnapshotSource) -> CapacityReport {
    let now = Utc::now();
    let mut snapshots = load_snapshots(source, now).await;

    for (name, err) in snapshots.errors() {
        state.metrics.inc_source_load_errors(name);
        state.logger.log_source_failure(name, err);
    }
    state.health_registry.record_refresh(&snapshots).await;

    snapshots.retain_last_good(&*state.snapshots.read().await);

    let (report, elapsed) = CapacityReport::build_timed(&snapshots, &state.engine, now);
    state.metrics.observe_evaluation_latency(elapsed.as_secs_f64());
    state.metrics.record_report(&report);
    state.logger.log_report(&report, elapsed.as_secs_f64());

    {
        let mut last = state.last_report.write().await;
        if let Some(previous) = last.as_ref() {
            state.logger.log_status_changes(previous, &report);
        }
        *last = Some(report.clone());
    }
    *state.snapshots.write().await = snapshots;
    state.health_registry.set_ready(true).await;

    report
}

/// Reload snapshots on an interval until shutdown is signalled
pub async fn refresh_loop(
    state: Arc<AppState>,
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                refresh_once(&state, source.as_ref()).await;
            }
        }
    }
}
