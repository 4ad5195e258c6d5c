// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{payload, setup_database};
use archivrs::domain::models::archive::ArchiveShadowRow;
use archivrs::domain::models::record::{Record, RecordFilter};
use archivrs::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use archivrs::domain::repositories::record_repository::{RecordRepository, RepositoryError};
use archivrs::infrastructure::repositories::archive_shadow_repo_impl::ArchiveShadowRepositoryImpl;
use archivrs::infrastructure::repositories::record_repo_impl::RecordRepositoryImpl;
use chrono::Utc;
use serde_json::{json, Map, Value};

#[tokio::test]
async fn test_record_filter_orders_by_id_descending() {
    let db = setup_database().await;
    let repo = RecordRepositoryImpl::new(db);
    for (id, section) in [(3, "cardio"), (1, "cardio"), (2, "neuro"), (5, "cardio")] {
        repo.insert(&Record::new(id, "create", section, "{}"))
            .await
            .unwrap();
    }

    let found = repo
        .find_by_filter(&RecordFilter::by_action_section("create", "cardio"))
        .await
        .unwrap();
    let ids: Vec<i64> = found.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![5, 3, 1]);

    let filter = RecordFilter {
        ids: Some(vec![1, 2]),
        ..RecordFilter::default()
    };
    let ids: Vec<i64> = repo
        .find_by_filter(&filter)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_record_round_trip_and_update() {
    let db = setup_database().await;
    let repo = RecordRepositoryImpl::new(db);
    let record = Record::new(10, "create", "cardio", r#"{"name": "Ada"}"#)
        .with_correlation_id("corr-10");
    repo.insert(&record).await.unwrap();

    let loaded = repo.find_by_id(10).await.unwrap().unwrap();
    assert_eq!(loaded.correlation(), Some("corr-10"));
    assert!(loaded.payload.is_empty());

    let mut fields = Map::new();
    fields.insert("payload".to_string(), json!({"name": "Ada"}));
    assert!(repo.update_fields(10, fields).await.unwrap());

    let updated = repo.find_by_id(10).await.unwrap().unwrap();
    assert_eq!(updated.payload, payload(&[("name", "Ada")]));
    assert_eq!(updated.object, r#"{"name": "Ada"}"#);
}

#[tokio::test]
async fn test_record_update_edge_cases() {
    let db = setup_database().await;
    let repo = RecordRepositoryImpl::new(db);
    repo.insert(&Record::new(1, "create", "cardio", "{}"))
        .await
        .unwrap();

    assert!(repo.find_by_id(404).await.unwrap().is_none());
    assert!(!repo.update_fields(404, Map::new()).await.unwrap());

    let mut bad_payload = Map::new();
    bad_payload.insert("payload".to_string(), Value::String("flat".to_string()));
    assert!(matches!(
        repo.update_fields(1, bad_payload).await,
        Err(RepositoryError::InvalidParameter(_))
    ));

    let mut unknown = Map::new();
    unknown.insert("owner".to_string(), json!("x"));
    assert!(matches!(
        repo.update_fields(1, unknown).await,
        Err(RepositoryError::InvalidParameter(_))
    ));
}

#[tokio::test]
async fn test_shadow_rows_are_unique_per_category() {
    let db = setup_database().await;
    let repo = ArchiveShadowRepositoryImpl::new(db);

    assert!(repo.insert_if_absent(&ArchiveShadowRow::new(1, 7, "corr-7")).await.unwrap());
    assert!(!repo.insert_if_absent(&ArchiveShadowRow::new(1, 7, "corr-7")).await.unwrap());
    assert!(repo.insert_if_absent(&ArchiveShadowRow::new(2, 7, "corr-7")).await.unwrap());

    let row = repo.find(1, 7).await.unwrap().unwrap();
    assert_eq!(row.correlation_id, "corr-7");
    assert!(row.is_pending());
    assert!(repo.find(3, 7).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pending_rows_and_mark_uploaded() {
    let db = setup_database().await;
    let repo = ArchiveShadowRepositoryImpl::new(db);
    for (data_type, record_id) in [(1, 1), (1, 3), (2, 2), (1, 2)] {
        repo.insert_if_absent(&ArchiveShadowRow::new(data_type, record_id, "c"))
            .await
            .unwrap();
    }

    assert!(repo.mark_uploaded(1, 3, "bafy-3", Utc::now()).await.unwrap());
    assert!(!repo.mark_uploaded(9, 9, "bafy-9", Utc::now()).await.unwrap());

    let pending: Vec<(i32, i64)> = repo
        .find_pending(None)
        .await
        .unwrap()
        .iter()
        .map(|row| (row.data_type, row.record_id))
        .collect();
    assert_eq!(pending, vec![(1, 2), (2, 2), (1, 1)]);

    let only_first: Vec<i64> = repo
        .find_pending(Some(1))
        .await
        .unwrap()
        .iter()
        .map(|row| row.record_id)
        .collect();
    assert_eq!(only_first, vec![2, 1]);

    let uploaded = repo.find(1, 3).await.unwrap().unwrap();
    assert_eq!(uploaded.archive_address, "bafy-3");
    assert!(uploaded.uploaded_at.is_some());
}
