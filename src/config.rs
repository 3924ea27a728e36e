use config as config_crate;
use serde::Deserialize;

/// Configuração operacional do sistema.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URL de conexão com o banco PostgreSQL.
    pub database_url: String,
    /// URL base da interface programática do GOCDB.
    pub gocdb_url: String,
    /// Timeout em segundos para cada requisição ao GOCDB.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Horizonte (horas) usado pelo modo master.
    #[serde(default = "default_master_horizon_hours")]
    pub master_horizon_hours: u32,
    /// Intervalo entre ciclos em segundos; 0 executa um único ciclo.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Inventário de recursos monitorados.
    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Inventário estático de sites e recursos.
///
/// Listas de entradas em vez de tabelas: o crate `config` normaliza chaves,
/// e os nomes internos precisam chegar intactos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub storage_elements: Vec<StorageElementConfig>,
    #[serde(default)]
    pub fts_servers: Vec<FtsServerConfig>,
    /// Hosts dos computing elements.
    #[serde(default)]
    pub computing_elements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    /// Nome do site no GOCDB; ausente se não for site de grid.
    pub goc_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageElementConfig {
    pub name: String,
    pub host: Option<String>,
    /// Convenção TXDY (ex.: T1D0, T0D1).
    pub se_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FtsServerConfig {
    /// URL do endpoint como configurado internamente.
    pub endpoint: String,
    pub goc_name: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_master_horizon_hours() -> u32 {
    120
}

fn default_refresh_interval_secs() -> u64 {
    1800
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config_crate::Config::builder()
            .add_source(config_crate::File::with_name("config"))
            .add_source(config_crate::Environment::with_prefix("DOWNTIME").separator("__"))
            .build()?;
        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.gocdb_url.trim().is_empty() {
            return Err("gocdb_url não pode ser vazio".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs deve ser maior que zero".into());
        }
        Ok(())
    }
}
