use chrono::{DateTime, TimeDelta, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio_postgres::Row;

/// Tag de serviço do GOCDB para storage em disco.
pub const SERVICE_TYPE_DISK: &str = "srm";
/// Tag de serviço do GOCDB para storage em fita.
pub const SERVICE_TYPE_TAPE: &str = "srm.nearline";
/// Tag de serviço do GOCDB para servidores de transferência.
pub const SERVICE_TYPE_FTS: &str = "FTS";

/// Granularidade do elemento (PostgreSQL)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSql, FromSql)]
#[postgres(name = "element_kind")]
pub enum ElementKind {
    Site,
    Resource,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Site => write!(f, "Site"),
            ElementKind::Resource => write!(f, "Resource"),
        }
    }
}

/// Severidade do downtime (PostgreSQL).
///
/// A ordem das variantes importa: OUTAGE vem antes de WARNING na ordenação
/// usada pelas consultas com horizonte.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSql, FromSql,
)]
#[postgres(name = "downtime_severity")]
pub enum Severity {
    #[postgres(name = "OUTAGE")]
    #[serde(rename = "OUTAGE")]
    Outage,
    #[postgres(name = "WARNING")]
    #[serde(rename = "WARNING")]
    Warning,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OUTAGE" => Ok(Severity::Outage),
            "WARNING" => Ok(Severity::Warning),
            other => Err(format!("severidade desconhecida: {other:?}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Outage => write!(f, "OUTAGE"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// Tipo interno do elemento, usado para decidir como traduzir o nome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    StorageElement,
    Fts,
    ComputingElement,
    Other(String),
}

impl From<&str> for ElementType {
    fn from(s: &str) -> Self {
        match s {
            "StorageElement" => ElementType::StorageElement,
            "FTS" | "FTS3" => ElementType::Fts,
            "CE" | "ComputingElement" => ElementType::ComputingElement,
            other => ElementType::Other(other.to_string()),
        }
    }
}

/// Downtime normalizado, unidade armazenada no cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeRecord {
    pub id: String,
    pub element: ElementKind,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub severity: Severity,
    pub description: String,
    pub link: String,
    pub service_type: Option<String>,
}

impl DowntimeRecord {
    /// Janela aberta nas duas pontas: `start < instant < end`.
    pub fn overlaps(&self, instant: DateTime<Utc>) -> bool {
        self.start_date < instant && instant < self.end_date
    }
}

impl From<Row> for DowntimeRecord {
    fn from(row: Row) -> Self {
        Self {
            id: row.get("downtime_id"),
            element: row.get("element"),
            name: row.get("name"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            severity: row.get("severity"),
            description: row.get("description"),
            link: row.get("link"),
            service_type: row.get("service_type"),
        }
    }
}

/// `now + hours`, saturando no maior instante representável.
pub fn hours_after(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    TimeDelta::try_hours(i64::from(hours))
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Consulta efêmera sobre um elemento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    pub element: ElementKind,
    pub name: String,
    pub element_type: ElementType,
    /// Horizonte em horas; `None` significa "agora".
    pub hours: Option<u32>,
    pub service_type: Option<String>,
}

impl ElementQuery {
    pub fn new(element: ElementKind, name: impl Into<String>, element_type: ElementType) -> Self {
        Self {
            element,
            name: name.into(),
            element_type,
            hours: None,
            service_type: None,
        }
    }

    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours = Some(hours);
        self
    }
}

/// Resultado da tradução de nome interno para o nome do registro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub element: ElementKind,
    pub name: String,
    pub service_type: Option<String>,
}

/// Registro cru, como devolvido pelo registro externo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDowntime {
    pub hostname: Option<String>,
    pub sitename: Option<String>,
    pub service_type: Option<String>,
    pub start: String,
    pub end: String,
    pub severity: String,
    pub description: String,
    pub link: String,
}
