mod support;

use chrono::{Duration, Utc};
use downtime_cache::memory::MemoryStore;
use downtime_cache::storage::DowntimeStore;
use downtime_cache::{
    DowntimeError, ElementKind, ElementQuery, ElementType, Severity, SourceError, clean, ingest,
    ingest_one,
};
use std::collections::BTreeSet;
use support::{FakeSource, grid_inventory, raw, record};

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Cache com uma linha que a limpeza removeria: link fora da lista ativa.
async fn store_with_stale_row(source: &FakeSource) -> MemoryStore {
    let now = Utc::now();
    let store = MemoryStore::new();
    store
        .upsert(&record(
            "stale",
            ElementKind::Resource,
            "srm.cern.ch",
            Severity::Outage,
            now - Duration::hours(1),
            now + Duration::hours(6),
            "https://goc/stale",
        ))
        .await
        .unwrap();
    source.set_active_links(["https://goc/other"]);
    store
}

#[tokio::test]
async fn no_downtimes_leaves_cache_untouched() {
    let now = Utc::now();
    let store = MemoryStore::new();
    // Expirado e fora da lista de links: só seria removido se a limpeza rodasse
    store
        .upsert(&record(
            "old",
            ElementKind::Resource,
            "srm.cern.ch",
            Severity::Outage,
            now - Duration::hours(10),
            now - Duration::hours(5),
            "https://goc/old",
        ))
        .await
        .unwrap();
    let source = FakeSource::new();

    let summary = ingest(&source, &store, ElementKind::Resource, &names(&["srm.cern.ch"]), Some(120))
        .await
        .unwrap();

    assert_eq!(summary.stored, 0);
    assert_eq!(summary.removed, 0);
    assert!(store.get("old").await.is_some());
    assert_eq!(source.link_calls(), 0);
}

#[tokio::test]
async fn ingest_stores_normalized_records() {
    let now = Utc::now();
    let source = FakeSource::new().with_downtime(
        ElementKind::Resource,
        "100G0 srm.cern.ch",
        raw(
            Some("srm.cern.ch"),
            Some("CERN-PROD"),
            "outage",
            now + Duration::hours(1),
            now + Duration::hours(3),
            "https://goc/100",
        ),
    );
    let store = MemoryStore::new();

    let summary = ingest(&source, &store, ElementKind::Resource, &names(&["srm.cern.ch"]), Some(120))
        .await
        .unwrap();
    assert_eq!(summary.stored, 1);

    let stored = store.get("100G0 srm.cern.ch").await.unwrap();
    assert_eq!(stored.name, "srm.cern.ch");
    assert_eq!(stored.severity, Severity::Outage);
    assert!(stored.start_date < stored.end_date);

    // Segunda passada atualiza o mesmo id
    ingest(&source, &store, ElementKind::Resource, &names(&["srm.cern.ch"]), Some(120))
        .await
        .unwrap();
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn clean_removes_record_missing_from_active_links() {
    let now = Utc::now();
    let store = MemoryStore::new();
    for (id, link) in [("cancelled", "https://goc/cancelled"), ("live", "https://goc/live")] {
        store
            .upsert(&record(
                id,
                ElementKind::Resource,
                "srm.cern.ch",
                Severity::Outage,
                now - Duration::hours(1),
                now + Duration::hours(4),
                link,
            ))
            .await
            .unwrap();
    }
    let source = FakeSource::new();
    source.set_active_links(["https://goc/live"]);

    let removed = clean(&source, &store, ElementKind::Resource, &names(&["srm.cern.ch"]))
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert!(store.get("cancelled").await.is_none());
    assert!(store.get("live").await.is_some());
}

#[tokio::test]
async fn clean_removes_expired_record_even_with_active_link() {
    let now = Utc::now();
    let store = MemoryStore::new();
    store
        .upsert(&record(
            "expired",
            ElementKind::Site,
            "CERN-PROD",
            Severity::Warning,
            now - Duration::hours(6),
            now - Duration::hours(1),
            "https://goc/expired",
        ))
        .await
        .unwrap();
    let source = FakeSource::new();
    source.set_active_links(["https://goc/expired"]);

    let removed = clean(&source, &store, ElementKind::Site, &names(&["CERN-PROD"]))
        .await
        .unwrap();

    assert_eq!(removed, 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn ingest_purges_stale_rows_before_storing() {
    let now = Utc::now();
    let store = MemoryStore::new();
    store
        .upsert(&record(
            "shortened",
            ElementKind::Resource,
            "srm.cern.ch",
            Severity::Outage,
            now - Duration::hours(1),
            now + Duration::hours(10),
            "https://goc/shortened",
        ))
        .await
        .unwrap();
    let source = FakeSource::new().with_downtime(
        ElementKind::Resource,
        "200G0 srm.cern.ch",
        raw(
            Some("srm.cern.ch"),
            None,
            "WARNING",
            now + Duration::hours(2),
            now + Duration::hours(5),
            "https://goc/200",
        ),
    );
    source.set_active_links(["https://goc/200"]);

    let summary = ingest(&source, &store, ElementKind::Resource, &names(&["srm.cern.ch"]), Some(120))
        .await
        .unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.stored, 1);
    assert!(store.get("shortened").await.is_none());
    assert!(store.get("200G0 srm.cern.ch").await.is_some());
}

#[tokio::test]
async fn service_type_mismatch_performs_no_upsert() {
    let now = Utc::now();
    let mut tape = raw(
        Some("srm.cern.ch"),
        None,
        "OUTAGE",
        now + Duration::hours(1),
        now + Duration::hours(2),
        "https://goc/300",
    );
    tape.service_type = Some("srm.nearline".into());
    let source = FakeSource::new().with_downtime(ElementKind::Resource, "300G0 srm.cern.ch", tape);
    let store = store_with_stale_row(&source).await;
    let inventory = grid_inventory();

    // CERN-DST é disco (T0D1): serviço declarado "srm"
    let query = ElementQuery::new(ElementKind::Resource, "CERN-DST", ElementType::StorageElement)
        .with_hours(24);
    let err = ingest_one(&source, &store, &inventory, &query).await.unwrap_err();

    assert!(matches!(err, DowntimeError::ServiceTypeMismatch { .. }));
    // Nem gravação nem limpeza
    assert!(store.get("300G0 srm.cern.ch").await.is_none());
    assert!(store.get("stale").await.is_some());
    assert_eq!(store.len().await, 1);
    assert_eq!(source.link_calls(), 0);
}

#[tokio::test]
async fn ingest_one_translates_site_name() {
    let now = Utc::now();
    let source = FakeSource::new().with_downtime(
        ElementKind::Site,
        "400G0 CERN-PROD",
        raw(
            None,
            Some("CERN-PROD"),
            "OUTAGE",
            now - Duration::hours(1),
            now + Duration::hours(1),
            "https://goc/400",
        ),
    );
    let store = MemoryStore::new();
    let inventory = grid_inventory();

    let query = ElementQuery::new(ElementKind::Site, "LCG.CERN.ch", ElementType::Other("Site".into()));
    let summary = ingest_one(&source, &store, &inventory, &query).await.unwrap();

    assert_eq!(summary.stored, 1);
    let cached = store.select(ElementKind::Site, "CERN-PROD", None).await.unwrap();
    assert_eq!(cached.len(), 1);
}

#[tokio::test]
async fn ingest_one_fails_for_unknown_storage_element() {
    let source = FakeSource::new();
    let store = MemoryStore::new();
    let inventory = grid_inventory();

    let query = ElementQuery::new(ElementKind::Resource, "NOWHERE-SE", ElementType::StorageElement);
    let err = ingest_one(&source, &store, &inventory, &query).await.unwrap_err();

    assert!(matches!(err, DowntimeError::Resolution { .. }));
    assert_eq!(source.status_calls(), 0);
}

#[tokio::test]
async fn malformed_record_aborts_whole_batch() {
    let now = Utc::now();
    let source = FakeSource::new()
        .with_downtime(
            ElementKind::Resource,
            "500G0 srm.cern.ch",
            raw(
                Some("srm.cern.ch"),
                None,
                "OUTAGE",
                now,
                now + Duration::hours(1),
                "https://goc/500",
            ),
        )
        .with_downtime(
            ElementKind::Resource,
            "501G0",
            raw(None, None, "OUTAGE", now, now + Duration::hours(1), "https://goc/501"),
        );
    let store = store_with_stale_row(&source).await;

    let err = ingest(&source, &store, ElementKind::Resource, &names(&["srm.cern.ch"]), Some(120))
        .await
        .unwrap_err();

    assert!(matches!(err, DowntimeError::MalformedRecord { .. }));
    assert!(store.get("500G0 srm.cern.ch").await.is_none());
    assert!(store.get("stale").await.is_some());
    assert_eq!(store.len().await, 1);
    assert_eq!(source.link_calls(), 0);
}

#[tokio::test]
async fn transient_failure_is_retried_once() {
    let now = Utc::now();
    let source = FakeSource::new().with_downtime(
        ElementKind::Resource,
        "600G0 ce01.cern.ch",
        raw(
            Some("ce01.cern.ch"),
            None,
            "WARNING",
            now,
            now + Duration::hours(2),
            "https://goc/600",
        ),
    );
    source.fail_transiently(1);
    let store = MemoryStore::new();

    let summary = ingest(&source, &store, ElementKind::Resource, &names(&["ce01.cern.ch"]), Some(120))
        .await
        .unwrap();

    assert_eq!(source.status_calls(), 2);
    assert_eq!(summary.stored, 1);
}

#[tokio::test]
async fn second_transient_failure_is_source_unavailable() {
    let source = FakeSource::new();
    source.fail_transiently(5);
    let store = MemoryStore::new();

    let err = ingest(&source, &store, ElementKind::Resource, &names(&["ce01.cern.ch"]), Some(120))
        .await
        .unwrap_err();

    assert!(matches!(err, DowntimeError::SourceUnavailable(_)));
    assert_eq!(source.status_calls(), 2);
}

#[tokio::test]
async fn invalid_response_is_not_retried() {
    let source = FakeSource::new();
    source.fail_always(ElementKind::Resource, SourceError::Invalid("HTTP 404".into()));
    let store = MemoryStore::new();

    let err = ingest(&source, &store, ElementKind::Resource, &names(&["ce01.cern.ch"]), Some(120))
        .await
        .unwrap_err();

    assert!(matches!(err, DowntimeError::SourceUnavailable(_)));
    assert_eq!(source.status_calls(), 1);
}
