use anyhow::Result;
use downtime_cache::config::Config;
use downtime_cache::gocdb::GocdbClient;
use downtime_cache::inventory::{ConfigInventory, Inventory};
use downtime_cache::scheduler;
use downtime_cache::source::DowntimeSource;
use downtime_cache::storage::{DowntimeStore, PgStore};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializa o sistema de logging (tracing)
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    if let Err(e) = config.validate() {
        anyhow::bail!("Configuração inválida: {e}");
    }
    info!("Configuração carregada");

    // Cache em PostgreSQL, com schema garantido
    let pg = PgStore::connect(&config.database_url).await?;
    pg.migrate().await?;
    let store: Arc<dyn DowntimeStore> = Arc::new(pg);
    info!("Banco de dados conectado");

    let source: Arc<dyn DowntimeSource> =
        Arc::new(GocdbClient::new(&config.gocdb_url, config.request_timeout_secs)?);
    let inventory: Arc<dyn Inventory> = Arc::new(ConfigInventory::new(config.inventory.clone()));

    info!("Iniciando os trabalhos");
    scheduler::run_scheduler(
        source,
        store,
        inventory,
        config.master_horizon_hours,
        config.refresh_interval_secs,
    )
    .await;

    Ok(())
}
