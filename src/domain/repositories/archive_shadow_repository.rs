// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::record_repository::RepositoryError;
use crate::domain::models::archive::ArchiveShadowRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 归档影子行仓库特质
#[async_trait]
pub trait ArchiveShadowRepository: Send + Sync {
    /// 插入影子行，`(data_type, record_id)` 已存在时不重复插入
    ///
    /// 返回是否真正插入了新行
    async fn insert_if_absent(&self, row: &ArchiveShadowRow) -> Result<bool, RepositoryError>;
    /// 查找影子行
    async fn find(
        &self,
        data_type: i32,
        record_id: i64,
    ) -> Result<Option<ArchiveShadowRow>, RepositoryError>;
    /// 查找尚未写入地址的影子行，按记录ID降序
    async fn find_pending(
        &self,
        data_type: Option<i32>,
    ) -> Result<Vec<ArchiveShadowRow>, RepositoryError>;
    /// 写入内容地址和上传时间，影子行不存在时返回 `Ok(false)`
    async fn mark_uploaded(
        &self,
        data_type: i32,
        record_id: i64,
        address: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}
