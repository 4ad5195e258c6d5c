// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::maintenance_task::{TaskItem, TaskParams};
use crate::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use crate::domain::services::maintenance_operation::MaintenanceOperation;
use crate::queue::archive_queue::ArchiveQueue;
use crate::utils::errors::MaintenanceError;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// 为未归档的影子行写入已知的内容地址
///
/// 批次已经在归档服务中存在、但地址未能写回时使用。
/// 必填参数 `ipfsAddress`，可选参数 `dataType`。
pub struct AssignArchiveAddress {
    shadows: Arc<dyn ArchiveShadowRepository>,
    queue: ArchiveQueue,
}

impl AssignArchiveAddress {
    pub const NAME: &'static str = "assignArchiveAddress";

    pub fn new(shadows: Arc<dyn ArchiveShadowRepository>, queue: ArchiveQueue) -> Self {
        Self { shadows, queue }
    }
}

#[async_trait]
impl MaintenanceOperation for AssignArchiveAddress {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, params: &TaskParams) -> Result<(), MaintenanceError> {
        params.require_str("ipfsAddress")?;
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

    async fn apply(&self, params: &TaskParams, item: &TaskItem) -> Result<bool, MaintenanceError> {
        let TaskItem::Shadow(row) = item else {
            return Err(MaintenanceError::per_record(
                item.identifier(),
                "expected an archive shadow row",
            ));
        };

        if !row.is_pending() {
            return Ok(false);
        }

        let address = params.ipfs_address().ok_or_else(|| {
            MaintenanceError::Validation("missing required field `ipfsAddress`".to_string())
        })?;
        let updated = self
            .shadows
            .mark_uploaded(row.data_type, row.record_id, address, Utc::now())
            .await
            .map_err(|e| MaintenanceError::per_record(row.record_id, e))?;

        if !updated {
            return Err(MaintenanceError::NotFound(format!(
                "shadow row for record {}",
                row.record_id
            )));
        }

        // Already archived; a later flush must not overwrite the address
        self.queue.remove(row.data_type, row.record_id);
        Ok(true)
    }
}
