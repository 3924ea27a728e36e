//! Cache de downtimes do GOCDB para o sistema de status de recursos.
//!
//! Ingestão (`ingest`), reconciliação do cache (`ingest::clean`), resolução de
//! janelas sobrepostas (`resolution`) e o modo master (`master`). Fonte e cache
//! são colaboradores passados explicitamente.

pub mod config;
pub mod error;
pub mod gocdb;
pub mod ingest;
pub mod inventory;
pub mod master;
pub mod memory;
pub mod resolution;
pub mod resolver;
pub mod scheduler;
pub mod source;
pub mod storage;
pub mod types;

pub use error::{DowntimeError, DowntimeResult, SourceError};
pub use ingest::{IngestSummary, clean, ingest, ingest_one};
pub use master::{MasterReport, run_all};
pub use resolution::{TieBreak, pick_downtime, resolve, resolve_at};
pub use types::{DowntimeRecord, ElementKind, ElementQuery, ElementType, ResourceIdentity, Severity};
