// src/scheduler.rs

use crate::inventory::Inventory;
use crate::master::run_all;
use crate::source::DowntimeSource;
use crate::storage::DowntimeStore;
use std::{sync::Arc, time::Duration, time::Instant};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

/// Executa o modo master periodicamente.
///
/// Com `interval_secs == 0` roda um único ciclo e retorna.
pub async fn run_scheduler(
    source: Arc<dyn DowntimeSource>,
    store: Arc<dyn DowntimeStore>,
    inventory: Arc<dyn Inventory>,
    horizon_hours: u32,
    interval_secs: u64,
) {
    if interval_secs == 0 {
        run_cycle(&*source, &*store, &*inventory, horizon_hours, 1).await;
        return;
    }

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle_number: u64 = 0;

    loop {
        ticker.tick().await;
        cycle_number += 1;
        run_cycle(&*source, &*store, &*inventory, horizon_hours, cycle_number).await;
    }
}

async fn run_cycle(
    source: &dyn DowntimeSource,
    store: &dyn DowntimeStore,
    inventory: &dyn Inventory,
    horizon_hours: u32,
    cycle_number: u64,
) {
    let cycle_start = Instant::now();
    info!("[AGENDADOR][CICLO {}] Iniciando ciclo.", cycle_number);

    match run_all(source, store, inventory, horizon_hours).await {
        Ok(report) => {
            for failure in &report.failures {
                warn!("[AGENDADOR][CICLO {}] Falha: {}", cycle_number, failure);
            }
            info!(
                "[AGENDADOR][CICLO {}] Fim do ciclo. Gravados: {}, removidos: {}, falhas: {}. Duração: {:?}",
                cycle_number,
                report.sites.stored + report.resources.stored,
                report.sites.removed + report.resources.removed,
                report.failures.len(),
                cycle_start.elapsed()
            );
        }
        Err(e) => {
            error!("[AGENDADOR][CICLO {}] Ciclo abortado: {}", cycle_number, e);
        }
    }
}
