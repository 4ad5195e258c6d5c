// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use archivrs::application::operations::requeue_pending_archives::RequeuePendingArchives;
use archivrs::application::use_cases::MaintenanceUseCase;
use archivrs::config::settings::Settings;
use archivrs::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use archivrs::domain::repositories::record_repository::RecordRepository;
use archivrs::domain::services::archive_upload_service::ArchiveUploadService;
use archivrs::domain::services::task_controller::TaskController;
use archivrs::infrastructure::database::connection;
use archivrs::infrastructure::metrics::init_metrics;
use archivrs::infrastructure::repositories::archive_shadow_repo_impl::ArchiveShadowRepositoryImpl;
use archivrs::infrastructure::repositories::record_repo_impl::RecordRepositoryImpl;
use archivrs::infrastructure::services::archive_upload_service_impl::ArchiveUploadServiceImpl;
use archivrs::queue::{ArchiveQueue, ArchiveUploader, FlushOutcome};
use archivrs::utils::telemetry;
use archivrs::workers::archive_flush_worker::ArchiveFlushWorker;
use archivrs::workers::worker::Worker;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动定时归档
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(settings.telemetry.json);
    info!("Starting archivrs...");
    init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize components
    let records: Arc<dyn RecordRepository> = Arc::new(RecordRepositoryImpl::new(db.clone()));
    let shadows: Arc<dyn ArchiveShadowRepository> =
        Arc::new(ArchiveShadowRepositoryImpl::new(db.clone()));
    let upload_service: Arc<dyn ArchiveUploadService> = Arc::new(ArchiveUploadServiceImpl::new(
        settings.archive.upload_url.clone(),
        Duration::from_secs(settings.archive.request_timeout_secs),
    ));
    let uploader = ArchiveUploader::new(
        upload_service,
        shadows.clone(),
        settings.archive.file_name_prefix.clone(),
    );
    let queue = ArchiveQueue::new(shadows.clone(), uploader, settings.archive.flush_threshold);
    info!("Archive queue flushes at {} records per data type", queue.threshold());

    let use_case = MaintenanceUseCase::with_builtin_operations(
        Arc::new(TaskController::new()),
        queue.clone(),
        settings.maintenance.clone(),
        records,
        shadows,
    );
    info!(
        "Registered maintenance operations: {}",
        use_case.operation_names().join(", ")
    );

    // 5. Reload shadow rows left pending by a previous run
    match use_case.start_task(RequeuePendingArchives::NAME, "{}") {
        Ok(handle) => {
            handle.wait().await;
            let snapshot = use_case.get_task_snapshot();
            info!(
                "Startup requeue finished: {} of {} pending rows queued",
                snapshot.done_count, snapshot.total_count
            );
        }
        Err(e) => warn!("Startup requeue skipped: {}", e),
    }

    // 6. Start workers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flush_worker = ArchiveFlushWorker::new(
        queue.clone(),
        Duration::from_secs(settings.archive.flush_interval_secs),
        shutdown_rx,
    );
    let flush_handle = flush_worker.start();

    // 7. Wait for shutdown
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if use_case.controller().can_start() {
        info!("No maintenance task running");
    } else if let Err(e) = use_case.request_stop() {
        error!("Failed to stop maintenance task: {}", e);
    }

    // Let an in-flight periodic flush settle before the final one
    if shutdown_tx.send(true).is_err() {
        warn!("Archive flush worker already stopped");
    }
    if let Err(e) = flush_handle.await {
        error!("Archive flush worker did not stop cleanly: {}", e);
    }

    for (data_type, result) in queue.flush_all().await {
        match result {
            Ok(FlushOutcome::Uploaded { address, count }) => info!(
                "Final flush archived {} records of data type {} at {}",
                count, data_type, address
            ),
            Ok(FlushOutcome::NoOp) => {}
            Err(e) => error!("Final flush of data type {} failed: {}", data_type, e),
        }
    }

    info!("archivrs stopped");
    Ok(())
}
