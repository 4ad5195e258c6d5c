// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::maintenance_task::{TaskItem, TaskParams};
use crate::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use crate::domain::repositories::record_repository::RecordRepository;
use crate::domain::services::maintenance_operation::MaintenanceOperation;
use crate::queue::archive_queue::ArchiveQueue;
use crate::utils::errors::MaintenanceError;
use async_trait::async_trait;
use std::sync::Arc;

/// 重新入队未归档的记录
///
/// 选取尚无内容地址的影子行，加载对应记录并放回归档队列。
/// 进程重启后内存队列丢失时使用。可选参数 `dataType` 限定分类。
pub struct RequeuePendingArchives {
    records: Arc<dyn RecordRepository>,
    shadows: Arc<dyn ArchiveShadowRepository>,
    queue: ArchiveQueue,
}

impl RequeuePendingArchives {
    pub const NAME: &'static str = "requeuePendingArchives";

    pub fn new(
        records: Arc<dyn RecordRepository>,
        shadows: Arc<dyn ArchiveShadowRepository>,
        queue: ArchiveQueue,
    ) -> Self {
        Self {
            records,
            shadows,
            queue,
        }
    }
}

#[async_trait]
impl MaintenanceOperation for RequeuePendingArchives {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, params: &TaskParams) -> Result<(), MaintenanceError> {
        params.data_type().map(|_| ())
    }

    async fn select(&self, params: &TaskParams) -> Result<Vec<TaskItem>, MaintenanceError> {
        let data_type = params.data_type()?;
        let rows = self
            .shadows
            .find_pending(data_type)
            .await
            .map_err(|e| MaintenanceError::Selection(e.to_string()))?;

        Ok(rows.into_iter().map(TaskItem::Shadow).collect())
    }

    async fn apply(&self, _params: &TaskParams, item: &TaskItem) -> Result<bool, MaintenanceError> {
        let TaskItem::Shadow(row) = item else {
            return Err(MaintenanceError::per_record(
                item.identifier(),
                "expected an archive shadow row",
            ));
        };

        if self.queue.contains(row.data_type, row.record_id) {
            return Ok(false);
        }

        let mut record = self
            .records
            .find_by_id(row.record_id)
            .await
            .map_err(|e| MaintenanceError::per_record(row.record_id, e))?
            .ok_or_else(|| MaintenanceError::NotFound(format!("record {}", row.record_id)))?;

        if record.correlation().is_none() {
            record.correlation_id = Some(row.correlation_id.clone());
        }

        let outcome = self
            .queue
            .add(row.data_type, record)
            .await
            .map_err(|e| MaintenanceError::per_record(row.record_id, e))?;

        Ok(outcome.inserted)
    }
}
