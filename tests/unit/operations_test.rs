// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{
    archived_record, build_queue, payload, InMemoryArchiveShadowRepository,
    InMemoryRecordRepository, MockUploadService,
};
use archivrs::application::operations::{
    AssignArchiveAddress, FixRecordObject, RequeuePendingArchives,
};
use archivrs::domain::models::archive::ArchiveShadowRow;
use archivrs::domain::models::maintenance_task::{TaskItem, TaskParams};
use archivrs::domain::models::record::Record;
use archivrs::domain::services::maintenance_operation::MaintenanceOperation;
use archivrs::queue::archive_queue::DEFAULT_FLUSH_THRESHOLD;
use archivrs::utils::errors::MaintenanceError;
use serde_json::json;
use std::sync::Arc;

fn params(raw: &str) -> TaskParams {
    TaskParams::parse(raw).unwrap()
}

fn fix_params() -> TaskParams {
    params(r#"{"action": "create", "section": "cardio"}"#)
}

#[tokio::test]
async fn test_fix_record_object_selects_matching_records_descending() {
    let records = Arc::new(InMemoryRecordRepository::with_records([
        Record::new(1, "create", "cardio", "{}"),
        Record::new(2, "create", "neuro", "{}"),
        Record::new(3, "update", "cardio", "{}"),
        Record::new(4, "create", "cardio", "{}"),
    ]));
    let operation = FixRecordObject::new(records);

    let items = operation.select(&fix_params()).await.unwrap();
    let ids: Vec<String> = items.iter().map(TaskItem::identifier).collect();
    assert_eq!(ids, vec!["4", "1"]);
}

#[tokio::test]
async fn test_fix_record_object_writes_parsed_payload() {
    let records = Arc::new(InMemoryRecordRepository::with_records([Record::new(
        1,
        "create",
        "cardio",
        r#"{"name": "Ada", "age": 36}"#,
    )]));
    let operation = FixRecordObject::new(records.clone());
    let item = TaskItem::Record(records.get(1).unwrap());

    assert!(operation.apply(&fix_params(), &item).await.unwrap());
    let fixed = records.get(1).unwrap();
    assert_eq!(fixed.payload.get("name"), Some(&json!("Ada")));
    assert_eq!(fixed.payload.get("age"), Some(&json!(36)));
}

#[tokio::test]
async fn test_fix_record_object_skips_populated_payload() {
    let populated = Record::new(1, "create", "cardio", r#"{"name": "other"}"#)
        .with_payload(payload(&[("name", "Ada")]));
    let records = Arc::new(InMemoryRecordRepository::with_records([populated.clone()]));
    let operation = FixRecordObject::new(records.clone());

    let changed = operation
        .apply(&fix_params(), &TaskItem::Record(populated))
        .await
        .unwrap();
    assert!(!changed);
    assert_eq!(records.get(1).unwrap().payload.get("name"), Some(&json!("Ada")));
}

#[tokio::test]
async fn test_fix_record_object_rejects_malformed_object() {
    let malformed = Record::new(9, "create", "cardio", "{name: Ada");
    let scalar = Record::new(10, "create", "cardio", "42");
    let records = Arc::new(InMemoryRecordRepository::with_records([
        malformed.clone(),
        scalar.clone(),
    ]));
    let operation = FixRecordObject::new(records);

    for record in [malformed, scalar] {
        let id = record.id;
        match operation.apply(&fix_params(), &TaskItem::Record(record)).await {
            Err(MaintenanceError::PerRecord { record_id, .. }) => {
                assert_eq!(record_id, id.to_string())
            }
            other => panic!("expected per-record error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_fix_record_object_missing_record() {
    let records = Arc::new(InMemoryRecordRepository::new());
    let operation = FixRecordObject::new(records);
    let ghost = Record::new(77, "create", "cardio", r#"{"a": 1}"#);

    assert!(matches!(
        operation.apply(&fix_params(), &TaskItem::Record(ghost)).await,
        Err(MaintenanceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_fix_record_object_selection_failure() {
    let records = Arc::new(InMemoryRecordRepository::new());
    records.set_unavailable(true);
    let operation = FixRecordObject::new(records);

    assert!(matches!(
        operation.select(&fix_params()).await,
        Err(MaintenanceError::Selection(_))
    ));
}

#[tokio::test]
async fn test_requeue_pending_archives_restores_queue() {
    let records = Arc::new(InMemoryRecordRepository::with_records([
        archived_record(1),
        Record::new(2, "create", "cardio", "{}"),
    ]));
    let shadows = Arc::new(InMemoryArchiveShadowRepository::new());
    shadows.put(ArchiveShadowRow::new(5, 1, "corr-1"));
    shadows.put(ArchiveShadowRow::new(5, 2, "corr-2"));
    shadows.put(ArchiveShadowRow::new(6, 3, "corr-3"));
    let mut done = ArchiveShadowRow::new(5, 4, "corr-4");
    done.archive_address = "bafy-old".to_string();
    shadows.put(done);

    let service = Arc::new(MockUploadService::new("bafy-ok"));
    let queue = build_queue(shadows.clone(), service, DEFAULT_FLUSH_THRESHOLD);
    let operation = RequeuePendingArchives::new(records, shadows, queue.clone());

    let task_params = params(r#"{"dataType": "5"}"#);
    let items = operation.select(&task_params).await.unwrap();
    let ids: Vec<String> = items.iter().map(TaskItem::identifier).collect();
    assert_eq!(ids, vec!["2", "1"]);

    for item in &items {
        assert!(operation.apply(&task_params, item).await.unwrap());
    }
    assert_eq!(queue.size(5), 2);
    assert!(queue.contains(5, 2));

    // Already queued
    assert!(!operation.apply(&task_params, &items[0]).await.unwrap());
}

#[tokio::test]
async fn test_requeue_pending_archives_missing_record() {
    let records = Arc::new(InMemoryRecordRepository::new());
    let shadows = Arc::new(InMemoryArchiveShadowRepository::new());
    shadows.put(ArchiveShadowRow::new(1, 99, "corr-99"));
    let service = Arc::new(MockUploadService::new("bafy-ok"));
    let queue = build_queue(shadows.clone(), service, DEFAULT_FLUSH_THRESHOLD);
    let operation = RequeuePendingArchives::new(records, shadows, queue.clone());

    let items = operation.select(&params("{}")).await.unwrap();
    assert_eq!(items.len(), 1);
    assert!(matches!(
        operation.apply(&params("{}"), &items[0]).await,
        Err(MaintenanceError::NotFound(_))
    ));
    assert_eq!(queue.size(1), 0);
}

#[tokio::test]
async fn test_assign_archive_address_stamps_pending_rows() {
    let shadows = Arc::new(InMemoryArchiveShadowRepository::new());
    let service = Arc::new(MockUploadService::new("bafy-ok"));
    let queue = build_queue(shadows.clone(), service.clone(), DEFAULT_FLUSH_THRESHOLD);
    queue.add(2, archived_record(1)).await.unwrap();
    queue.add(2, archived_record(2)).await.unwrap();
    queue.add(3, archived_record(3)).await.unwrap();

    let operation = AssignArchiveAddress::new(shadows.clone(), queue.clone());
    let task_params = params(r#"{"ipfsAddress": "bafy-known", "dataType": 2}"#);
    operation.validate(&task_params).unwrap();

    let items = operation.select(&task_params).await.unwrap();
    assert_eq!(items.len(), 2);
    for item in &items {
        assert!(operation.apply(&task_params, item).await.unwrap());
    }

    assert_eq!(shadows.get(2, 1).unwrap().archive_address, "bafy-known");
    assert_eq!(shadows.get(2, 2).unwrap().archive_address, "bafy-known");
    assert!(shadows.get(3, 3).unwrap().is_pending());
    assert_eq!(queue.size(2), 0);
    assert_eq!(queue.size(3), 1);

    let stamped = TaskItem::Shadow(shadows.get(2, 1).unwrap());
    assert!(!operation.apply(&task_params, &stamped).await.unwrap());
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn test_assign_archive_address_requires_address() {
    let shadows = Arc::new(InMemoryArchiveShadowRepository::new());
    let service = Arc::new(MockUploadService::new("bafy-ok"));
    let queue = build_queue(shadows.clone(), service, DEFAULT_FLUSH_THRESHOLD);
    let operation = AssignArchiveAddress::new(shadows, queue);

    assert!(matches!(
        operation.validate(&params(r#"{"ipfsAddress": "  "}"#)),
        Err(MaintenanceError::Validation(_))
    ));
}
