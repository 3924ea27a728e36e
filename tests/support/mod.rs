#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use downtime_cache::config::{FtsServerConfig, InventoryConfig, SiteConfig, StorageElementConfig};
use downtime_cache::inventory::{ConfigInventory, Inventory, StorageElementInfo};
use downtime_cache::source::DowntimeSource;
use downtime_cache::types::RawDowntime;
use downtime_cache::{DowntimeError, DowntimeRecord, DowntimeResult, ElementKind, Severity, SourceError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fonte falsa com respostas por granularidade e falhas programáveis.
#[derive(Default)]
pub struct FakeSource {
    responses: Mutex<HashMap<ElementKind, BTreeMap<String, RawDowntime>>>,
    failing: Mutex<HashMap<ElementKind, SourceError>>,
    transient_failures: AtomicUsize,
    active_links: Mutex<BTreeSet<String>>,
    status_calls: AtomicUsize,
    link_calls: AtomicUsize,
    calls: Mutex<Vec<StatusCall>>,
}

/// Argumentos de uma chamada a `get_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCall {
    pub element: ElementKind,
    pub names: BTreeSet<String>,
    pub hours: Option<u32>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_downtime(self, element: ElementKind, id: &str, raw: RawDowntime) -> Self {
        self.add_downtime(element, id, raw);
        self
    }

    pub fn add_downtime(&self, element: ElementKind, id: &str, raw: RawDowntime) {
        self.responses
            .lock()
            .unwrap()
            .entry(element)
            .or_default()
            .insert(id.to_string(), raw);
    }

    /// As próximas `times` chamadas a `get_status` falham de forma transitória.
    pub fn fail_transiently(&self, times: usize) {
        self.transient_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_always(&self, element: ElementKind, err: SourceError) {
        self.failing.lock().unwrap().insert(element, err);
    }

    pub fn set_active_links<'a>(&self, links: impl IntoIterator<Item = &'a str>) {
        *self.active_links.lock().unwrap() = links.into_iter().map(str::to_string).collect();
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn link_calls(&self) -> usize {
        self.link_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<StatusCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DowntimeSource for FakeSource {
    async fn get_status(
        &self,
        element: ElementKind,
        names: &BTreeSet<String>,
        starting_within_hours: Option<u32>,
    ) -> Result<BTreeMap<String, RawDowntime>, SourceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(StatusCall {
            element,
            names: names.clone(),
            hours: starting_within_hours,
        });
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(SourceError::Transient("connection reset".into()));
        }
        if let Some(err) = self.failing.lock().unwrap().get(&element) {
            return Err(err.clone());
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&element)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_active_links(&self) -> Result<BTreeSet<String>, SourceError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.active_links.lock().unwrap().clone())
    }
}

/// Inventário com coleções que podem falhar (`None`).
pub struct FakeInventory {
    pub lookups: ConfigInventory,
    pub sites: Option<Vec<String>>,
    pub storage: Option<Vec<String>>,
    pub fts: Option<Vec<String>>,
    pub computing: Option<Vec<String>>,
}

fn listed(collection: &Option<Vec<String>>, label: &str) -> DowntimeResult<Vec<String>> {
    collection
        .clone()
        .ok_or_else(|| DowntimeError::Inventory(format!("{label} indisponível")))
}

impl Inventory for FakeInventory {
    fn goc_site_name(&self, site: &str) -> Option<String> {
        self.lookups.goc_site_name(site)
    }

    fn storage_element(&self, name: &str) -> Option<StorageElementInfo> {
        self.lookups.storage_element(name)
    }

    fn goc_fts_name(&self, endpoint: &str) -> Option<String> {
        self.lookups.goc_fts_name(endpoint)
    }

    fn goc_sites(&self) -> DowntimeResult<Vec<String>> {
        listed(&self.sites, "sites")
    }

    fn storage_hosts(&self) -> DowntimeResult<Vec<String>> {
        listed(&self.storage, "storage")
    }

    fn fts_servers(&self) -> DowntimeResult<Vec<String>> {
        listed(&self.fts, "fts")
    }

    fn computing_elements(&self) -> DowntimeResult<Vec<String>> {
        listed(&self.computing, "computing")
    }
}

pub fn grid_inventory() -> ConfigInventory {
    ConfigInventory::new(InventoryConfig {
        sites: vec![SiteConfig {
            name: "LCG.CERN.ch".into(),
            goc_name: Some("CERN-PROD".into()),
        }],
        storage_elements: vec![
            StorageElementConfig {
                name: "CERN-DST".into(),
                host: Some("srm.cern.ch".into()),
                se_type: Some("T0D1".into()),
            },
            StorageElementConfig {
                name: "CERN-RAW".into(),
                host: Some("srm.cern.ch".into()),
                se_type: Some("T1D0".into()),
            },
        ],
        fts_servers: vec![FtsServerConfig {
            endpoint: "https://fts3.cern.ch:8446".into(),
            goc_name: Some("fts3.cern.ch".into()),
        }],
        computing_elements: vec!["ce01.cern.ch".into()],
    })
}

pub fn raw(
    host: Option<&str>,
    site: Option<&str>,
    severity: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    link: &str,
) -> RawDowntime {
    RawDowntime {
        hostname: host.map(str::to_string),
        sitename: site.map(str::to_string),
        service_type: None,
        start: start.format("%Y-%m-%d %H:%M").to_string(),
        end: end.format("%Y-%m-%d %H:%M").to_string(),
        severity: severity.to_string(),
        description: "manutenção programada".into(),
        link: link.to_string(),
    }
}

pub fn record(
    id: &str,
    element: ElementKind,
    name: &str,
    severity: Severity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    link: &str,
) -> DowntimeRecord {
    DowntimeRecord {
        id: id.to_string(),
        element,
        name: name.to_string(),
        start_date: start,
        end_date: end,
        severity,
        description: String::new(),
        link: link.to_string(),
        service_type: None,
    }
}
