//! Headless consumers of the synchronization engine.
//!
//! One watcher per dashboard concern: the depot watcher follows the
//! dimensional depot inventory, the storage watcher joins world inventory
//! with production statistics and flags items whose stock is draining.

use std::time::Duration;

use lib_telemetry::{
    Balance, CloudInvModel, ProdStatsModel, ProductionStatFm, Subscription, SyncEngine,
    WorldInvFm, WorldInvModel, classify, merge_storage,
};
use tokio::sync::broadcast;
use tokio::time::{MissedTickBehavior, interval};

pub async fn run_depot_watch(
    engine: SyncEngine,
    report_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut depot = engine.subscribe::<CloudInvModel>();
    let mut report = interval(report_interval);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Depot watch shutting down.");
                break;
            }
            changed = depot.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(items) = depot.latest() {
                    log::debug!("depot: snapshot updated, {} item types", items.len());
                }
            }
            _ = report.tick() => {
                match depot.latest() {
                    Some(items) => {
                        let total: i64 = items.iter().map(|i| i.amount).sum();
                        log::info!("depot: {} item types, {total} units total", items.len());
                    }
                    None => log::info!(
                        "depot: waiting for first snapshot ({} failed polls)",
                        depot.error_count()
                    ),
                }
            }
        }
    }
}

pub async fn run_storage_watch(
    engine: SyncEngine,
    report_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut inventory = engine.subscribe::<WorldInvModel>();
    let mut stats = engine.subscribe::<ProdStatsModel>();
    let mut report = interval(report_interval);
    report.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Storage watch shutting down.");
                break;
            }
            changed = inventory.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = stats.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = report.tick() => {
                report_storage(&inventory, &stats);
            }
        }
    }
}

fn report_storage(
    inventory: &Subscription<WorldInvFm>,
    stats: &Subscription<ProductionStatFm>,
) {
    let (Some(items), Some(rates)) = (inventory.latest(), stats.latest()) else {
        log::info!(
            "storage: waiting for first snapshots ({} / {} failed polls)",
            inventory.error_count(),
            stats.error_count()
        );
        return;
    };

    let merged = merge_storage(&items, &rates);
    let mut deficits = 0usize;
    let mut surpluses = 0usize;
    let mut balanced = 0usize;

    for row in &merged {
        match classify(row.current_production, row.current_consumption) {
            Balance::Deficit => {
                deficits += 1;
                log::warn!(
                    "storage: {} is draining: {} on hand, {}",
                    row.display_name(),
                    row.amount,
                    row.production_per_minute
                );
            }
            Balance::Surplus => surpluses += 1,
            Balance::Balanced => balanced += 1,
        }
    }

    log::info!(
        "storage: {} items ({deficits} deficit / {surpluses} surplus / {balanced} balanced)",
        merged.len()
    );
}
