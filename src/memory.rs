use crate::error::DowntimeResult;
use crate::storage::DowntimeStore;
use crate::types::{DowntimeRecord, ElementKind};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Cache em memória, indexado pelo id do downtime.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, DowntimeRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<DowntimeRecord> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl DowntimeStore for MemoryStore {
    async fn upsert(&self, record: &DowntimeRecord) -> DowntimeResult<()> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn select(
        &self,
        element: ElementKind,
        name: &str,
        service_type: Option<&str>,
    ) -> DowntimeResult<Vec<DowntimeRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.element == element && r.name == name)
            .filter(|r| match service_type {
                Some(wanted) => r
                    .service_type
                    .as_deref()
                    .is_some_and(|st| st.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> DowntimeResult<()> {
        self.records.write().await.remove(id);
        Ok(())
    }
}
