// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::maintenance_task::{TaskItem, TaskParams};
use crate::utils::errors::MaintenanceError;
use async_trait::async_trait;

/// 维护操作特质
///
/// 每个操作由名称注册，包含三部分：
/// - `validate`：创建任务时同步执行的参数校验
/// - `select`：preparing 阶段的候选查询，必须返回确定的顺序
/// - `apply`：对单条候选执行的修补，`Ok(true)` 表示发生了修改，
///   `Ok(false)` 表示记录已经正确、无需修改
#[async_trait]
pub trait MaintenanceOperation: Send + Sync {
    /// 操作名称，即创建任务时使用的 task type
    fn name(&self) -> &'static str;

    /// 校验参数
    fn validate(&self, params: &TaskParams) -> Result<(), MaintenanceError> {
        let _ = params;
        Ok(())
    }

    /// 查询候选项
    async fn select(&self, params: &TaskParams) -> Result<Vec<TaskItem>, MaintenanceError>;

    /// 处理单条候选项
    async fn apply(&self, params: &TaskParams, item: &TaskItem) -> Result<bool, MaintenanceError>;
}
