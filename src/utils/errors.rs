// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::record_repository::RepositoryError;
use thiserror::Error;

/// 维护任务与归档流水线错误类型
///
/// - `Conflict` / `Validation`：同步返回给创建任务的调用方
/// - `Selection`：终止任务于 preparing 阶段，写入 `lastError`
/// - `PerRecord` / `NotFound`：单条记录失败，写入坏记录列表后继续
/// - `Upload`：归档上传失败，批次被放回队列
#[derive(Error, Debug)]
pub enum MaintenanceError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Selection failed: {0}")]
    Selection(String),

    #[error("Record {record_id} failed: {reason}")]
    PerRecord { record_id: String, reason: String },

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl MaintenanceError {
    pub fn per_record(record_id: impl ToString, reason: impl ToString) -> Self {
        Self::PerRecord {
            record_id: record_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("维护错误: {0}")]
    Maintenance(#[from] MaintenanceError),
}
