use thiserror::Error;

/// Erros do núcleo de downtimes.
#[derive(Debug, Error)]
pub enum DowntimeError {
    /// Nome interno sem tradução possível para o registro.
    #[error("falha ao resolver identidade de {name}: {reason}")]
    Resolution { name: String, reason: String },

    /// Registro externo indisponível mesmo após a segunda tentativa.
    #[error("registro de downtimes indisponível: {0}")]
    SourceUnavailable(String),

    /// Registro devolvido pela fonte sem os campos mínimos.
    #[error("registro de downtime malformado ({id}): {reason}")]
    MalformedRecord { id: String, reason: String },

    /// Tipo de serviço declarado diverge do observado no registro.
    #[error("SERVICE_TYPE divergente entre GOCDB ({observed}) e configuração ({declared}) para {name}")]
    ServiceTypeMismatch {
        name: String,
        declared: String,
        observed: String,
    },

    /// Falha de leitura/escrita no cache.
    #[error("erro no cache de downtimes: {0}")]
    Cache(String),

    /// Inventário de recursos não pôde ser consultado.
    #[error("erro no inventário de recursos: {0}")]
    Inventory(String),
}

pub type DowntimeResult<T> = Result<T, DowntimeError>;

/// Erros devolvidos pelos adaptadores da fonte de downtimes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Falha de rede passível de nova tentativa.
    #[error("falha transitória: {0}")]
    Transient(String),

    /// Resposta inválida; repetir não ajuda.
    #[error("resposta inválida: {0}")]
    Invalid(String),
}

impl SourceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

impl From<SourceError> for DowntimeError {
    fn from(err: SourceError) -> Self {
        DowntimeError::SourceUnavailable(err.to_string())
    }
}

impl From<tokio_postgres::Error> for DowntimeError {
    fn from(err: tokio_postgres::Error) -> Self {
        DowntimeError::Cache(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for DowntimeError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        DowntimeError::Cache(err.to_string())
    }
}
