//! Ingestão de downtimes do GOCDB e reconciliação do cache
//!
//! A fonte é consultada com uma única nova tentativa em falha transitória.
//! O lote inteiro é normalizado antes de qualquer escrita: se um registro
//! for rejeitado, o cache fica intocado.

use crate::error::{DowntimeError, DowntimeResult};
use crate::inventory::Inventory;
use crate::resolver::resolve_identity;
use crate::source::DowntimeSource;
use crate::storage::DowntimeStore;
use crate::types::{DowntimeRecord, ElementKind, ElementQuery, RawDowntime, Severity};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Formatos de data aceitos do registro (FORMATED_START_DATE e afins).
const REGISTRY_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Resumo de uma passada de ingestão.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Registros gravados (inseridos ou atualizados).
    pub stored: usize,
    /// Registros removidos pela limpeza.
    pub removed: usize,
}

/// Ingestão em lote: `names` já estão no formato do registro.
pub async fn ingest<S, D>(
    source: &S,
    store: &D,
    element: ElementKind,
    names: &BTreeSet<String>,
    horizon_hours: Option<u32>,
) -> DowntimeResult<IngestSummary>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
{
    ingest_names(source, store, element, names, horizon_hours, None).await
}

/// Ingestão de um único recurso: resolve a identidade e delega ao lote.
pub async fn ingest_one<S, D, I>(
    source: &S,
    store: &D,
    inventory: &I,
    query: &ElementQuery,
) -> DowntimeResult<IngestSummary>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
    I: Inventory + ?Sized,
{
    let identity = resolve_identity(inventory, query.element, &query.name, &query.element_type)?;
    // Tipo pedido pelo chamador tem prioridade sobre o inferido
    let declared = query.service_type.clone().or(identity.service_type);
    let names = BTreeSet::from([identity.name]);
    ingest_names(
        source,
        store,
        identity.element,
        &names,
        query.hours,
        declared.as_deref(),
    )
    .await
}

async fn ingest_names<S, D>(
    source: &S,
    store: &D,
    element: ElementKind,
    names: &BTreeSet<String>,
    horizon_hours: Option<u32>,
    declared_service_type: Option<&str>,
) -> DowntimeResult<IngestSummary>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
{
    let raw = fetch_status(source, element, names, horizon_hours).await?;

    if raw.is_empty() {
        debug!(
            "[DOWNTIME] Nenhum downtime para {} {} elemento(s); cache mantido.",
            element,
            names.len()
        );
        return Ok(IngestSummary::default());
    }

    let records = raw
        .iter()
        .map(|(id, dt)| normalize(id, dt, element, declared_service_type))
        .collect::<DowntimeResult<Vec<_>>>()?;

    let removed = clean(source, store, element, names).await?;

    for record in &records {
        store.upsert(record).await?;
    }

    info!(
        "[DOWNTIME] {}: {} downtime(s) gravado(s), {} removido(s) do cache.",
        element,
        records.len(),
        removed
    );
    Ok(IngestSummary {
        stored: records.len(),
        removed,
    })
}

/// Consulta a fonte com exatamente uma nova tentativa em falha transitória.
async fn fetch_status<S: DowntimeSource + ?Sized>(
    source: &S,
    element: ElementKind,
    names: &BTreeSet<String>,
    horizon_hours: Option<u32>,
) -> DowntimeResult<BTreeMap<String, RawDowntime>> {
    match source.get_status(element, names, horizon_hours).await {
        Ok(raw) => Ok(raw),
        Err(e) if e.is_transient() => {
            warn!("[DOWNTIME] Falha ao consultar o GOCDB ({}); nova tentativa.", e);
            Ok(source.get_status(element, names, horizon_hours).await?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove do cache downtimes expirados ou ausentes da lista de links ativos.
pub async fn clean<S, D>(
    source: &S,
    store: &D,
    element: ElementKind,
    names: &BTreeSet<String>,
) -> DowntimeResult<usize>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
{
    clean_at(source, store, element, names, Utc::now()).await
}

pub async fn clean_at<S, D>(
    source: &S,
    store: &D,
    element: ElementKind,
    names: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> DowntimeResult<usize>
where
    S: DowntimeSource + ?Sized,
    D: DowntimeStore + ?Sized,
{
    let mut active_links: Option<BTreeSet<String>> = None;
    let mut removed = 0;

    for name in names {
        let cached = store.select(element, name, None).await?;
        if cached.is_empty() {
            continue;
        }

        // Snapshot da lista de links só é buscado se houver algo a verificar
        let links = match active_links.take() {
            Some(links) => links,
            None => source.get_active_links().await?,
        };

        for dt in cached {
            if dt.end_date < now || !links.contains(&dt.link) {
                debug!(
                    "[LIMPEZA] Removendo downtime {} de {} (fim {}).",
                    dt.id, dt.name, dt.end_date
                );
                store.delete(&dt.id).await?;
                removed += 1;
            }
        }
        active_links = Some(links);
    }
    Ok(removed)
}

/// Converte um registro cru do GOCDB em `DowntimeRecord`.
pub fn normalize(
    id: &str,
    raw: &RawDowntime,
    element: ElementKind,
    declared_service_type: Option<&str>,
) -> DowntimeResult<DowntimeRecord> {
    let malformed = |reason: String| DowntimeError::MalformedRecord {
        id: id.to_string(),
        reason,
    };

    let name = [raw.hostname.as_deref(), raw.sitename.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|n| !n.is_empty())
        .ok_or_else(|| malformed("SITENAME e HOSTNAME ausentes".into()))?
        .to_string();

    let service_type = raw
        .service_type
        .as_deref()
        .map(str::trim)
        .filter(|st| !st.is_empty());
    if let (Some(observed), Some(declared)) = (service_type, declared_service_type) {
        if !observed.eq_ignore_ascii_case(declared) {
            return Err(DowntimeError::ServiceTypeMismatch {
                name,
                declared: declared.to_string(),
                observed: observed.to_string(),
            });
        }
    }

    let start_date = parse_registry_date(&raw.start)
        .ok_or_else(|| malformed(format!("data de início inválida: {:?}", raw.start)))?;
    let end_date = parse_registry_date(&raw.end)
        .ok_or_else(|| malformed(format!("data de fim inválida: {:?}", raw.end)))?;
    if start_date >= end_date {
        return Err(malformed(format!(
            "início ({start_date}) não é anterior ao fim ({end_date})"
        )));
    }

    let severity = raw.severity.parse::<Severity>().map_err(malformed)?;

    Ok(DowntimeRecord {
        id: id.to_string(),
        element,
        name,
        start_date,
        end_date,
        severity,
        description: raw.description.trim().to_string(),
        link: raw.link.trim().to_string(),
        service_type: service_type.map(str::to_string),
    })
}

/// Datas do registro são UTC sem fuso explícito; RFC 3339 também é aceito.
pub fn parse_registry_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    REGISTRY_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}
