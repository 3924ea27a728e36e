//! Leitura do cache e escolha de um único downtime por elemento
//!
//! Única fonte de verdade para "este recurso está em downtime?": a resposta
//! sai sempre do cache já reconciliado com a lista de links ativos.

use crate::error::DowntimeResult;
use crate::inventory::Inventory;
use crate::resolver::resolve_identity;
use crate::storage::DowntimeStore;
use crate::types::{DowntimeRecord, ElementKind, ElementQuery, Severity, hours_after};
use chrono::{DateTime, Utc};

/// Política de desempate entre janelas sobrepostas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Consulta com horizonte: vence a janela que começa primeiro,
    /// ordenando por `(nome, severidade, início)`.
    EarliestStart,
    /// Consulta no presente: OUTAGE domina WARNING; dentro da mesma
    /// severidade vence a que termina por último.
    LatestEnd,
}

impl TieBreak {
    pub fn for_hours(hours: Option<u32>) -> Self {
        match hours {
            Some(_) => TieBreak::EarliestStart,
            None => TieBreak::LatestEnd,
        }
    }
}

/// Downtime vigente (ou futuro) para o elemento da consulta.
pub async fn resolve<D, I>(
    store: &D,
    inventory: &I,
    query: &ElementQuery,
) -> DowntimeResult<Option<DowntimeRecord>>
where
    D: DowntimeStore + ?Sized,
    I: Inventory + ?Sized,
{
    resolve_at(store, inventory, query, Utc::now()).await
}

/// Como [`resolve`], com o instante "agora" explícito.
pub async fn resolve_at<D, I>(
    store: &D,
    inventory: &I,
    query: &ElementQuery,
    now: DateTime<Utc>,
) -> DowntimeResult<Option<DowntimeRecord>>
where
    D: DowntimeStore + ?Sized,
    I: Inventory + ?Sized,
{
    let identity = resolve_identity(inventory, query.element, &query.name, &query.element_type)?;
    let service_type = query.service_type.clone().or(identity.service_type);
    resolve_resolved_at(
        store,
        identity.element,
        &identity.name,
        service_type.as_deref(),
        query.hours,
        now,
    )
    .await
}

/// Versão para nomes já no formato do registro (sem passar pelo resolver).
pub async fn resolve_resolved_at<D: DowntimeStore + ?Sized>(
    store: &D,
    element: ElementKind,
    name: &str,
    service_type: Option<&str>,
    hours: Option<u32>,
    now: DateTime<Utc>,
) -> DowntimeResult<Option<DowntimeRecord>> {
    let records = store.select(element, name, service_type).await?;
    let target = target_instant(now, hours);
    Ok(pick_downtime(records, target, TieBreak::for_hours(hours)))
}

/// `now`, ou `now + hours` para consultas com horizonte.
///
/// Horizontes além do calendário do chrono saturam em `MAX_UTC`; nenhuma
/// janela termina depois disso, então a consulta resolve para ausente.
pub fn target_instant(now: DateTime<Utc>, hours: Option<u32>) -> DateTime<Utc> {
    match hours {
        Some(h) => hours_after(now, h),
        None => now,
    }
}

/// Filtra as janelas que cobrem `target` e escolhe uma segundo `policy`.
///
/// Função pura: o resultado não depende da ordem de `records`.
pub fn pick_downtime(
    records: Vec<DowntimeRecord>,
    target: DateTime<Utc>,
    policy: TieBreak,
) -> Option<DowntimeRecord> {
    let mut overlapping: Vec<DowntimeRecord> =
        records.into_iter().filter(|dt| dt.overlaps(target)).collect();

    match policy {
        TieBreak::EarliestStart => {
            overlapping.sort_by(|a, b| {
                (&a.name, a.severity, a.start_date, &a.id)
                    .cmp(&(&b.name, b.severity, b.start_date, &b.id))
            });
            overlapping.into_iter().next()
        }
        TieBreak::LatestEnd => {
            let latest = |severity: Severity| {
                overlapping
                    .iter()
                    .filter(|dt| dt.severity == severity)
                    .max_by(|a, b| (a.end_date, &a.id).cmp(&(b.end_date, &b.id)))
                    .cloned()
            };
            latest(Severity::Outage).or_else(|| latest(Severity::Warning))
        }
    }
}
