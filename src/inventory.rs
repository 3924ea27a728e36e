// src/inventory.rs

use crate::config::InventoryConfig;
use crate::error::{DowntimeError, DowntimeResult};

/// Dados de um storage element necessários para consultar o GOCDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageElementInfo {
    pub host: Option<String>,
    pub se_type: Option<String>,
}

/// Colaborador de inventário: enumeração de coleções e traduções de nome.
///
/// Todas as operações são consultas puras; `None` significa "não encontrado".
pub trait Inventory: Send + Sync {
    /// Nome do site no GOCDB.
    fn goc_site_name(&self, site: &str) -> Option<String>;

    /// Descrição do storage element; `None` se ele não puder ser instanciado.
    fn storage_element(&self, name: &str) -> Option<StorageElementInfo>;

    /// Nome no GOCDB de um endpoint FTS.
    fn goc_fts_name(&self, endpoint: &str) -> Option<String>;

    fn goc_sites(&self) -> DowntimeResult<Vec<String>>;

    fn storage_hosts(&self) -> DowntimeResult<Vec<String>>;

    fn fts_servers(&self) -> DowntimeResult<Vec<String>>;

    fn computing_elements(&self) -> DowntimeResult<Vec<String>>;
}

/// Inventário lido da seção `[inventory]` do arquivo de configuração.
#[derive(Debug, Clone, Default)]
pub struct ConfigInventory {
    config: InventoryConfig,
}

impl ConfigInventory {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }
}

impl Inventory for ConfigInventory {
    fn goc_site_name(&self, site: &str) -> Option<String> {
        self.config
            .sites
            .iter()
            .find(|s| s.name == site)
            .and_then(|s| s.goc_name.clone())
    }

    fn storage_element(&self, name: &str) -> Option<StorageElementInfo> {
        self.config
            .storage_elements
            .iter()
            .find(|se| se.name == name)
            .map(|se| StorageElementInfo {
                host: se.host.clone(),
                se_type: se.se_type.clone(),
            })
    }

    fn goc_fts_name(&self, endpoint: &str) -> Option<String> {
        self.config
            .fts_servers
            .iter()
            .find(|f| f.endpoint == endpoint)
            .and_then(|f| f.goc_name.clone())
    }

    fn goc_sites(&self) -> DowntimeResult<Vec<String>> {
        let mut sites: Vec<String> = self
            .config
            .sites
            .iter()
            .filter_map(|s| s.goc_name.clone())
            .collect();
        sites.sort();
        sites.dedup();
        Ok(sites)
    }

    fn storage_hosts(&self) -> DowntimeResult<Vec<String>> {
        let mut hosts = Vec::with_capacity(self.config.storage_elements.len());
        for se in &self.config.storage_elements {
            match &se.host {
                Some(host) => hosts.push(host.clone()),
                None => {
                    return Err(DowntimeError::Inventory(format!(
                        "storage element {} sem host",
                        se.name
                    )));
                }
            }
        }
        hosts.sort();
        hosts.dedup();
        Ok(hosts)
    }

    fn fts_servers(&self) -> DowntimeResult<Vec<String>> {
        Ok(self
            .config
            .fts_servers
            .iter()
            .map(|f| f.goc_name.clone().unwrap_or_else(|| f.endpoint.clone()))
            .collect())
    }

    fn computing_elements(&self) -> DowntimeResult<Vec<String>> {
        Ok(self.config.computing_elements.clone())
    }
}
