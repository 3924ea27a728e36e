use crate::error::SourceError;
use crate::types::{ElementKind, RawDowntime};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Fonte autoritativa de downtimes (GOCDB ou equivalente).
#[async_trait]
pub trait DowntimeSource: Send + Sync {
    /// Downtimes em andamento ou que começam nas próximas `starting_within_hours`
    /// horas, para os nomes pedidos. `None` consulta apenas os em andamento.
    /// Mapa vazio significa "nenhum downtime".
    async fn get_status(
        &self,
        element: ElementKind,
        names: &BTreeSet<String>,
        starting_within_hours: Option<u32>,
    ) -> Result<BTreeMap<String, RawDowntime>, SourceError>;

    /// Links de todos os downtimes atualmente ativos no registro.
    async fn get_active_links(&self) -> Result<BTreeSet<String>, SourceError>;
}
