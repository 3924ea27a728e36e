//! Ingestão de todas as coleções de recursos
//!
//! Sites e recursos são ingeridos em passadas independentes (e concorrentes);
//! falha em uma não impede a outra.

use crate::error::{DowntimeError, DowntimeResult};
use crate::ingest::{IngestSummary, ingest};
use crate::inventory::Inventory;
use crate::source::DowntimeSource;
use crate::storage::DowntimeStore;
use crate::types::ElementKind;
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Resultado de uma execução do modo master.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterReport {
    /// Mensagens de falha por coleção.
    pub failures: Vec<String>,
    pub sites: IngestSummary,
    pub resources: IngestSummary,
}

/// Enumera sites, hosts de storage, servidores FTS e computing elements e
/// ingere os downtimes de cada grupo com horizonte `horizon_hours`.
///
/// Só falha se nenhuma coleção puder ser enumerada.
pub async fn run_all<S, D, I>(
    source: &S,
    store: &D,
    inventory: &I,
    horizon_hours: u32,
) -> DowntimeResult<MasterReport>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
    I: Inventory + ?Sized,
{
    let mut report = MasterReport::default();

    // TODO: catálogos de arquivos também precisam entrar pelos seus hosts.
    let collections: [(&str, DowntimeResult<Vec<String>>); 4] = [
        ("sites", inventory.goc_sites()),
        ("storage", inventory.storage_hosts()),
        ("fts", inventory.fts_servers()),
        ("computing", inventory.computing_elements()),
    ];

    let mut sites = BTreeSet::new();
    let mut resources = BTreeSet::new();
    let mut enumerated = 0;
    for (label, collection) in collections {
        match collection {
            Ok(names) => {
                enumerated += 1;
                if label == "sites" {
                    sites.extend(names);
                } else {
                    resources.extend(names);
                }
            }
            Err(e) => {
                error!("[MASTER] Falha ao enumerar coleção {}: {}", label, e);
                report.failures.push(format!("{label}: {e}"));
            }
        }
    }
    if enumerated == 0 {
        return Err(DowntimeError::Inventory(
            "nenhuma coleção de recursos pôde ser enumerada".into(),
        ));
    }

    debug!("[MASTER] Processando sites: {:?}", sites);
    debug!("[MASTER] Processando recursos: {:?}", resources);

    let (site_res, resource_res) = tokio::join!(
        ingest_collection(source, store, ElementKind::Site, &sites, horizon_hours),
        ingest_collection(source, store, ElementKind::Resource, &resources, horizon_hours),
    );

    match site_res {
        Ok(summary) => report.sites = summary,
        Err(e) => {
            error!("[MASTER] Falha na ingestão de sites: {}", e);
            report.failures.push(e.to_string());
        }
    }
    match resource_res {
        Ok(summary) => report.resources = summary,
        Err(e) => {
            error!("[MASTER] Falha na ingestão de recursos: {}", e);
            report.failures.push(e.to_string());
        }
    }

    info!(
        "[MASTER] Concluído: {} site(s), {} recurso(s), {} falha(s).",
        sites.len(),
        resources.len(),
        report.failures.len()
    );
    Ok(report)
}

async fn ingest_collection<S, D>(
    source: &S,
    store: &D,
    element: ElementKind,
    names: &BTreeSet<String>,
    horizon_hours: u32,
) -> DowntimeResult<IngestSummary>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
{
    if names.is_empty() {
        debug!("[MASTER] Coleção {} vazia; nada a consultar.", element);
        return Ok(IngestSummary::default());
    }
    ingest(source, store, element, names, Some(horizon_hours)).await
}
