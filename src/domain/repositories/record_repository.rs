// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::{Record, RecordFilter};
use async_trait::async_trait;
use sea_orm::DbErr;
use serde_json::{Map, Value};
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 无效参数
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 记录仓库特质
///
/// 记录表属于外部系统，这里只声明维护任务需要的最小契约。
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// 按条件查询记录，结果按ID降序排列
    async fn find_by_filter(&self, filter: &RecordFilter) -> Result<Vec<Record>, RepositoryError>;
    /// 根据ID查找记录
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>, RepositoryError>;
    /// 更新指定字段，记录不存在时返回 `Ok(false)`
    async fn update_fields(
        &self,
        id: i64,
        fields: Map<String, Value>,
    ) -> Result<bool, RepositoryError>;
}
