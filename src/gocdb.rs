//! Cliente da interface programática do GOCDB
//!
//! Consulta `get_downtime` (em andamento e a partir de hoje), filtra pelos
//! nomes pedidos e devolve registros crus; datas são interpretadas na
//! normalização, não aqui.

use crate::error::SourceError;
use crate::source::DowntimeSource;
use crate::types::{ElementKind, RawDowntime, hours_after};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use reqwest::StatusCode;
use quick_xml::events::Event;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration as StdDuration;
use tracing::debug;

/// Entrada `<DOWNTIME>` do XML do GOCDB.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GocdbDowntime {
    pub primary_key: String,
    pub hostname: Option<String>,
    pub sitename: Option<String>,
    pub service_type: Option<String>,
    pub severity: String,
    pub description: String,
    pub formatted_start: String,
    pub formatted_end: String,
    /// START_DATE/END_DATE em segundos desde a época.
    pub start_epoch: Option<i64>,
    pub end_epoch: Option<i64>,
    pub portal_url: String,
}

impl GocdbDowntime {
    fn to_raw(&self, element: ElementKind) -> RawDowntime {
        RawDowntime {
            hostname: match element {
                ElementKind::Site => None,
                ElementKind::Resource => self.hostname.clone(),
            },
            sitename: self.sitename.clone(),
            service_type: self.service_type.clone(),
            start: self.formatted_start.clone(),
            end: self.formatted_end.clone(),
            severity: self.severity.clone(),
            description: self.description.clone(),
            link: self.portal_url.clone(),
        }
    }

    /// Começa antes de `limit`; sem START_DATE o registro é mantido.
    fn starts_before(&self, limit: DateTime<Utc>) -> bool {
        match self.start_epoch {
            Some(start) => start <= limit.timestamp(),
            None => true,
        }
    }

    fn ended_before(&self, now: DateTime<Utc>) -> bool {
        self.end_epoch.is_some_and(|end| end < now.timestamp())
    }
}

pub struct GocdbClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl GocdbClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Invalid(format!("cliente HTTP: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<Vec<GocdbDowntime>, SourceError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(params)
            .send()
            .await
            .map_err(classify_request_error)?;

        classify_status(response.status())?;

        let body = response.text().await.map_err(classify_request_error)?;
        parse_downtimes(&body)
    }

    /// Downtimes em andamento mais os que começam a partir de hoje.
    async fn ongoing_and_upcoming(&self) -> Result<Vec<GocdbDowntime>, SourceError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut downtimes = self
            .fetch(&[("method", "get_downtime"), ("ongoing_only", "yes")])
            .await?;
        downtimes.extend(
            self.fetch(&[("method", "get_downtime"), ("startdate", today.as_str())])
                .await?,
        );
        Ok(downtimes)
    }
}

#[async_trait]
impl DowntimeSource for GocdbClient {
    async fn get_status(
        &self,
        element: ElementKind,
        names: &BTreeSet<String>,
        starting_within_hours: Option<u32>,
    ) -> Result<BTreeMap<String, RawDowntime>, SourceError> {
        let downtimes = match starting_within_hours {
            Some(_) => self.ongoing_and_upcoming().await?,
            None => {
                self.fetch(&[("method", "get_downtime"), ("ongoing_only", "yes")])
                    .await?
            }
        };
        let selected = select_downtimes(&downtimes, element, names, starting_within_hours, Utc::now());
        debug!(
            "[GOCDB] {} de {} downtime(s) selecionado(s) para {} {} nome(s).",
            selected.len(),
            downtimes.len(),
            element,
            names.len()
        );
        Ok(selected)
    }

    async fn get_active_links(&self) -> Result<BTreeSet<String>, SourceError> {
        Ok(self
            .ongoing_and_upcoming()
            .await?
            .into_iter()
            .map(|dt| dt.portal_url)
            .filter(|link| !link.is_empty())
            .collect())
    }
}

/// 5xx é transitório; qualquer outro status fora de 2xx é definitivo.
fn classify_status(status: StatusCode) -> Result<(), SourceError> {
    if status.is_server_error() {
        Err(SourceError::Transient(format!("GOCDB respondeu {status}")))
    } else if !status.is_success() {
        Err(SourceError::Invalid(format!("GOCDB respondeu {status}")))
    } else {
        Ok(())
    }
}

fn classify_request_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        SourceError::Transient(err.to_string())
    } else {
        SourceError::Invalid(err.to_string())
    }
}

/// Filtra por nome (host para recursos, site para sites) e horizonte.
///
/// A chave combina PRIMARY_KEY e o nome: um mesmo downtime do GOCDB pode
/// cobrir vários endpoints.
pub fn select_downtimes(
    downtimes: &[GocdbDowntime],
    element: ElementKind,
    names: &BTreeSet<String>,
    starting_within_hours: Option<u32>,
    now: DateTime<Utc>,
) -> BTreeMap<String, RawDowntime> {
    let limit = starting_within_hours.map(|h| hours_after(now, h));
    let mut selected = BTreeMap::new();

    for dt in downtimes {
        let key_name = match element {
            ElementKind::Site => dt.sitename.as_ref(),
            ElementKind::Resource => dt.hostname.as_ref(),
        };
        let Some(key_name) = key_name.filter(|n| names.contains(*n)) else {
            continue;
        };
        if dt.ended_before(now) {
            continue;
        }
        if let Some(limit) = limit {
            if !dt.starts_before(limit) {
                continue;
            }
        }
        selected.insert(format!("{} {}", dt.primary_key, key_name), dt.to_raw(element));
    }
    selected
}

/// Interpreta a resposta XML de `get_downtime`.
pub fn parse_downtimes(xml: &str) -> Result<Vec<GocdbDowntime>, SourceError> {
    let mut reader = Reader::from_str(xml);

    let mut downtimes = Vec::new();
    let mut current: Option<GocdbDowntime> = None;
    // Profundidade dentro de <DOWNTIME>; só filhos diretos interessam
    let mut depth = 0usize;
    let mut field: Option<Vec<u8>> = None;
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                if current.is_none() && local_name.as_ref() == b"DOWNTIME" {
                    let mut dt = GocdbDowntime::default();
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"PRIMARY_KEY" {
                            dt.primary_key = String::from_utf8_lossy(&attr.value).to_string();
                        }
                    }
                    current = Some(dt);
                    depth = 0;
                } else if current.is_some() {
                    depth += 1;
                    if depth == 1 {
                        field = Some(local_name.as_ref().to_vec());
                        text_buf.clear();
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if current.is_none() {
                    continue;
                }
                if depth == 0 && e.local_name().as_ref() == b"DOWNTIME" {
                    if let Some(dt) = current.take() {
                        downtimes.push(dt);
                    }
                    continue;
                }
                if depth == 1 {
                    if let (Some(dt), Some(name)) = (current.as_mut(), field.take()) {
                        assign_field(dt, &name, text_buf.trim());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(ref e)) => {
                if field.is_some() && depth == 1 {
                    let text = e
                        .unescape()
                        .map_err(|err| SourceError::Invalid(format!("XML do GOCDB: {err}")))?;
                    text_buf.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() && depth == 1 {
                    text_buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Invalid(format!("XML do GOCDB: {e}"))),
            _ => {}
        }
    }

    Ok(downtimes)
}

fn assign_field(dt: &mut GocdbDowntime, name: &[u8], value: &str) {
    let owned = || Some(value.to_string()).filter(|v| !v.is_empty());
    match name {
        b"PRIMARY_KEY" => {
            if !value.is_empty() {
                dt.primary_key = value.to_string();
            }
        }
        b"HOSTNAME" => dt.hostname = owned(),
        b"SITENAME" => dt.sitename = owned(),
        b"SERVICE_TYPE" => dt.service_type = owned(),
        b"SEVERITY" => dt.severity = value.to_string(),
        b"DESCRIPTION" => dt.description = value.to_string(),
        b"FORMATED_START_DATE" => dt.formatted_start = value.to_string(),
        b"FORMATED_END_DATE" => dt.formatted_end = value.to_string(),
        b"START_DATE" => dt.start_epoch = value.parse().ok(),
        b"END_DATE" => dt.end_epoch = value.parse().ok(),
        b"GOCDB_PORTAL_URL" => dt.portal_url = value.to_string(),
        _ => {}
    }
}
