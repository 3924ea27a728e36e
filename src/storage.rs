use crate::error::{DowntimeError, DowntimeResult};
use crate::types::{DowntimeRecord, ElementKind};
use async_trait::async_trait;
use deadpool_postgres::{Config as PoolConfig, Pool, Runtime};
use tokio_postgres::NoTls;

/// Cache persistente de downtimes normalizados.
///
/// `upsert` e `delete` precisam ser atômicos por registro: passadas de
/// ingestão concorrentes para nomes diferentes não podem se corromper.
#[async_trait]
pub trait DowntimeStore: Send + Sync {
    async fn upsert(&self, record: &DowntimeRecord) -> DowntimeResult<()>;

    /// Registros de `(element, name)`; `service_type`, se dado, filtra sem
    /// diferenciar maiúsculas.
    async fn select(
        &self,
        element: ElementKind,
        name: &str,
        service_type: Option<&str>,
    ) -> DowntimeResult<Vec<DowntimeRecord>>;

    async fn delete(&self, id: &str) -> DowntimeResult<()>;
}

const SCHEMA: &str = include_str!("../sql/downtime_cache.sql");

/// Cache em PostgreSQL.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> DowntimeResult<Self> {
        let mut cfg = PoolConfig::new();
        cfg.url = Some(database_url.to_string());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DowntimeError::Cache(e.to_string()))?;
        // Garante que o banco responde antes de seguir
        let client = pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(Self { pool })
    }

    /// Cria tipos, tabela e índice se ainda não existirem.
    pub async fn migrate(&self) -> DowntimeResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl DowntimeStore for PgStore {
    async fn upsert(&self, record: &DowntimeRecord) -> DowntimeResult<()> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO downtime_cache
                (downtime_id, element, name, start_date, end_date, severity, description, link, service_type, last_check_time)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
                ON CONFLICT (downtime_id) DO UPDATE SET
                    element = EXCLUDED.element,
                    name = EXCLUDED.name,
                    start_date = EXCLUDED.start_date,
                    end_date = EXCLUDED.end_date,
                    severity = EXCLUDED.severity,
                    description = EXCLUDED.description,
                    link = EXCLUDED.link,
                    service_type = EXCLUDED.service_type,
                    last_check_time = now()
                "#,
            )
            .await?;
        client
            .execute(
                &stmt,
                &[
                    &record.id,
                    &record.element,
                    &record.name,
                    &record.start_date,
                    &record.end_date,
                    &record.severity,
                    &record.description,
                    &record.link,
                    &record.service_type,
                ],
            )
            .await?;
        Ok(())
    }

    async fn select(
        &self,
        element: ElementKind,
        name: &str,
        service_type: Option<&str>,
    ) -> DowntimeResult<Vec<DowntimeRecord>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                r#"
                SELECT downtime_id, element, name, start_date, end_date, severity, description, link, service_type
                FROM downtime_cache
                WHERE element = $1
                  AND name = $2
                  AND ($3::text IS NULL OR lower(service_type) = lower($3::text))
                ORDER BY name, severity, start_date
                "#,
            )
            .await?;
        let rows = client.query(&stmt, &[&element, &name, &service_type]).await?;
        Ok(rows.into_iter().map(DowntimeRecord::from).collect())
    }

    async fn delete(&self, id: &str) -> DowntimeResult<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM downtime_cache WHERE downtime_id = $1", &[&id])
            .await?;
        Ok(())
    }
}
