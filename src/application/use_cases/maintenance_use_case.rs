// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::operations::{
    AssignArchiveAddress, FixRecordObject, RequeuePendingArchives,
};
use crate::config::settings::MaintenanceSettings;
use crate::domain::models::maintenance_task::{TaskParams, TaskStateView};
use crate::domain::models::record::Record;
use crate::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use crate::domain::repositories::record_repository::RecordRepository;
use crate::domain::services::maintenance_operation::MaintenanceOperation;
use crate::domain::services::task_controller::TaskController;
use crate::queue::archive_queue::ArchiveQueue;
use crate::utils::errors::MaintenanceError;
use crate::workers::maintenance_worker::{MaintenanceWorker, TaskHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 维护用例
///
/// 对外暴露的操作入口：创建/停止维护任务、查询任务状态、
/// 把记录放入归档队列以及查看队列长度。
pub struct MaintenanceUseCase {
    controller: Arc<TaskController>,
    operations: HashMap<&'static str, Arc<dyn MaintenanceOperation>>,
    queue: ArchiveQueue,
    settings: MaintenanceSettings,
}

impl MaintenanceUseCase {
    /// 创建一个未注册任何操作的用例
    pub fn new(
        controller: Arc<TaskController>,
        queue: ArchiveQueue,
        settings: MaintenanceSettings,
    ) -> Self {
        Self {
            controller,
            operations: HashMap::new(),
            queue,
            settings,
        }
    }

    /// 创建用例并注册内置操作
    pub fn with_builtin_operations(
        controller: Arc<TaskController>,
        queue: ArchiveQueue,
        settings: MaintenanceSettings,
        records: Arc<dyn RecordRepository>,
        shadows: Arc<dyn ArchiveShadowRepository>,
    ) -> Self {
        let mut use_case = Self::new(controller, queue.clone(), settings);
        use_case.register(Arc::new(FixRecordObject::new(records.clone())));
        use_case.register(Arc::new(RequeuePendingArchives::new(
            records,
            shadows.clone(),
            queue.clone(),
        )));
        use_case.register(Arc::new(AssignArchiveAddress::new(shadows, queue)));
        use_case
    }

    /// 注册操作，同名操作会被替换
    pub fn register(&mut self, operation: Arc<dyn MaintenanceOperation>) {
        self.operations.insert(operation.name(), operation);
    }

    pub fn operation_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.operations.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// 启动维护任务并返回句柄
    ///
    /// 依次解析参数、查找操作、校验参数、占用任务槽位，
    /// 然后在后台启动工作器，不等待任务完成。
    ///
    /// # 返回值
    ///
    /// * `Ok(TaskHandle)` - 任务已启动
    /// * `Err(MaintenanceError::Validation)` - 参数或任务类型无效
    /// * `Err(MaintenanceError::Conflict)` - 已有任务在运行
    pub fn start_task(
        &self,
        task_type: &str,
        params_json: &str,
    ) -> Result<TaskHandle, MaintenanceError> {
        let params = TaskParams::parse(params_json)?;
        let operation = self.operations.get(task_type).cloned().ok_or_else(|| {
            MaintenanceError::Validation(format!("unknown task type: {}", task_type))
        })?;
        operation.validate(&params)?;

        let task_id = self.controller.begin(operation.name(), &params)?;
        info!("Starting maintenance task {} ({})", task_id, task_type);

        let worker = MaintenanceWorker::new(
            self.controller.clone(),
            operation,
            params,
            self.settings.clone(),
        );
        Ok(worker.spawn(task_id))
    }

    /// 创建维护任务，立即返回任务ID
    pub fn create_task(&self, task_type: &str, params_json: &str) -> Result<String, MaintenanceError> {
        self.start_task(task_type, params_json)
            .map(|handle| handle.task_id().to_string())
    }

    pub fn request_stop(&self) -> Result<(), MaintenanceError> {
        self.controller.request_stop()
    }

    pub fn get_task_snapshot(&self) -> TaskStateView {
        self.controller.snapshot()
    }

    /// 把记录放入归档队列
    ///
    /// 达到阈值时触发的后台上传不会被等待。
    pub async fn enqueue_for_archive(
        &self,
        data_type: i32,
        record: Record,
    ) -> Result<(), MaintenanceError> {
        self.queue.add(data_type, record).await.map(|_| ())
    }

    pub fn get_queue_sizes(&self) -> HashMap<i32, usize> {
        self.queue.sizes_by_category()
    }

    pub fn controller(&self) -> &Arc<TaskController> {
        &self.controller
    }

    pub fn queue(&self) -> &ArchiveQueue {
        &self.queue
    }
}
