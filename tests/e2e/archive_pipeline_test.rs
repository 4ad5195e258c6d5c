// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{archived_record, fast_settings, setup_database};
use archivrs::application::use_cases::MaintenanceUseCase;
use archivrs::domain::models::maintenance_task::TaskStatus;
use archivrs::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use archivrs::domain::services::archive_upload_service::ArchiveUploadService;
use archivrs::domain::services::task_controller::TaskController;
use archivrs::infrastructure::repositories::archive_shadow_repo_impl::ArchiveShadowRepositoryImpl;
use archivrs::infrastructure::repositories::record_repo_impl::RecordRepositoryImpl;
use archivrs::infrastructure::services::archive_upload_service_impl::ArchiveUploadServiceImpl;
use archivrs::queue::{ArchiveQueue, ArchiveUploader, FlushOutcome};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Pipeline {
    use_case: MaintenanceUseCase,
    shadows: Arc<ArchiveShadowRepositoryImpl>,
}

/// 每次调用模拟一次进程启动：新的内存队列，共享同一个数据库
fn start(db: &Arc<DatabaseConnection>, server: &MockServer) -> Pipeline {
    let records = Arc::new(RecordRepositoryImpl::new(db.clone()));
    let shadows = Arc::new(ArchiveShadowRepositoryImpl::new(db.clone()));
    let service: Arc<dyn ArchiveUploadService> = Arc::new(ArchiveUploadServiceImpl::new(
        format!("{}/archive/upload", server.uri()),
        Duration::from_secs(5),
    ));
    let uploader = ArchiveUploader::new(service, shadows.clone(), "archive");
    let queue = ArchiveQueue::new(shadows.clone(), uploader, 1000);
    let use_case = MaintenanceUseCase::with_builtin_operations(
        Arc::new(TaskController::new()),
        queue,
        fast_settings(),
        records,
        shadows.clone(),
    );
    Pipeline { use_case, shadows }
}

async fn seed_records(db: &Arc<DatabaseConnection>, ids: impl IntoIterator<Item = i64>) {
    let repo = RecordRepositoryImpl::new(db.clone());
    for id in ids {
        repo.insert(&archived_record(id)).await.unwrap();
    }
}

#[tokio::test]
async fn test_enqueue_flush_writes_addresses() {
    let db = setup_database().await;
    seed_records(&db, 1..=3).await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/archive/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"address": "bafy-e2e"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = start(&db, &server);
    for id in 1..=3 {
        pipeline
            .use_case
            .enqueue_for_archive(8, archived_record(id))
            .await
            .unwrap();
    }
    assert_eq!(pipeline.use_case.get_queue_sizes().get(&8), Some(&3));

    let results = pipeline.use_case.queue().flush_all().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        (8, Ok(FlushOutcome::Uploaded { count: 3, address })) if address == "bafy-e2e"
    ));
    assert!(pipeline.use_case.get_queue_sizes().is_empty());

    for id in 1..=3 {
        let row = pipeline.shadows.find(8, id).await.unwrap().unwrap();
        assert_eq!(row.archive_address, "bafy-e2e");
        assert_eq!(row.correlation_id, format!("corr-{}", id));
    }
}

#[tokio::test]
async fn test_failed_upload_recovers_after_restart() {
    let db = setup_database().await;
    seed_records(&db, 1..=4).await;

    // First process: the archive service is down
    let down = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&down)
        .await;
    let first = start(&db, &down);
    for id in 1..=4 {
        first
            .use_case
            .enqueue_for_archive(2, archived_record(id))
            .await
            .unwrap();
    }
    let results = first.use_case.queue().flush_all().await;
    assert!(results[0].1.is_err());
    assert_eq!(first.use_case.get_queue_sizes().get(&2), Some(&4));
    assert_eq!(first.shadows.find_pending(Some(2)).await.unwrap().len(), 4);

    // Second process: empty queue, pending shadow rows survive
    let up = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"address": "bafy-retry"}})),
        )
        .expect(1)
        .mount(&up)
        .await;
    let second = start(&db, &up);
    assert!(second.use_case.get_queue_sizes().is_empty());

    second
        .use_case
        .start_task("requeuePendingArchives", r#"{"dataType": 2}"#)
        .unwrap()
        .wait()
        .await;
    let view = second.use_case.get_task_snapshot();
    assert_eq!(view.status, TaskStatus::Finished);
    assert_eq!(view.total_count, 4);
    assert_eq!(view.done_count, 4);
    assert_eq!(second.use_case.get_queue_sizes().get(&2), Some(&4));

    let results = second.use_case.queue().flush_all().await;
    assert!(matches!(results[0], (2, Ok(FlushOutcome::Uploaded { count: 4, .. }))));
    assert!(second.shadows.find_pending(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assign_archive_address_recommits_pending_rows() {
    let db = setup_database().await;
    seed_records(&db, 1..=3).await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"address": "bafy-x"}})))
        .expect(0)
        .mount(&server)
        .await;

    let pipeline = start(&db, &server);
    for id in 1..=3 {
        pipeline
            .use_case
            .enqueue_for_archive(5, archived_record(id))
            .await
            .unwrap();
    }

    pipeline
        .use_case
        .start_task(
            "assignArchiveAddress",
            r#"{"ipfsAddress": "bafy-known", "dataType": 5, "isTest": true}"#,
        )
        .unwrap()
        .wait()
        .await;

    let view = pipeline.use_case.get_task_snapshot();
    assert_eq!(view.done_count, 3);
    assert!(view.bad_records.is_empty());
    assert!(pipeline.use_case.get_queue_sizes().is_empty());
    for id in 1..=3 {
        let row = pipeline.shadows.find(5, id).await.unwrap().unwrap();
        assert_eq!(row.archive_address, "bafy-known");
    }
}
