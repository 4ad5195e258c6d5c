// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MaintenanceSettings;
use crate::domain::models::maintenance_task::{TaskItem, TaskParams};
use crate::domain::services::maintenance_operation::MaintenanceOperation;
use crate::domain::services::task_controller::TaskController;
use crate::utils::errors::{MaintenanceError, WorkerError};
use crate::workers::worker::Worker;
use async_trait::async_trait;
use futures::FutureExt;
use metrics::counter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 已启动任务的句柄
///
/// 调用方通常直接丢弃句柄（任务继续在后台运行）；测试用它等待任务结束。
pub struct TaskHandle {
    task_id: String,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// 等待任务结束
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            error!("Maintenance task {} aborted: {}", self.task_id, e);
        }
    }
}

/// 维护任务工作器
///
/// 执行一次维护任务：在 preparing 阶段查询候选项，随后逐条处理，
/// 每条记录之前检查停止标志。所有进度都写入注入的 `TaskController`。
pub struct MaintenanceWorker {
    controller: Arc<TaskController>,
    operation: Arc<dyn MaintenanceOperation>,
    params: TaskParams,
    settings: MaintenanceSettings,
}

impl MaintenanceWorker {
    pub fn new(
        controller: Arc<TaskController>,
        operation: Arc<dyn MaintenanceOperation>,
        params: TaskParams,
        settings: MaintenanceSettings,
    ) -> Self {
        Self {
            controller,
            operation,
            params,
            settings,
        }
    }

    /// 在后台启动
    pub fn spawn(self, task_id: String) -> TaskHandle {
        let handle = tokio::spawn(async move {
            self.execute().await;
        });
        TaskHandle { task_id, handle }
    }

    /// 执行任务直到结束
    ///
    /// 不返回错误：致命错误写入 `lastError`，单条失败写入坏记录列表。
    pub async fn execute(&self) {
        let name = self.operation.name();

        let selection = AssertUnwindSafe(self.operation.select(&self.params))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(MaintenanceError::Selection(
                    "selection panicked".to_string(),
                ))
            });

        let mut items = match selection {
            Ok(items) => items,
            Err(e) => {
                error!("Maintenance task {} failed while preparing: {}", name, e);
                self.controller.finish(Some(e.to_string()));
                return;
            }
        };

        if self.params.is_test() && items.len() > self.settings.test_run_limit {
            info!(
                "Test run of {}: truncating {} candidates to {}",
                name,
                items.len(),
                self.settings.test_run_limit
            );
            items.truncate(self.settings.test_run_limit);
        }

        self.controller.mark_running(items.len());
        info!("Maintenance task {} running over {} items", name, items.len());

        let delay = self.settings.record_delay();
        for (index, item) in items.iter().enumerate() {
            if self.controller.is_cancel_requested() {
                info!(
                    "Maintenance task {} stopped after {} of {} items",
                    name,
                    index,
                    items.len()
                );
                break;
            }

            self.process(item).await;

            if !delay.is_zero() && index + 1 < items.len() {
                sleep(delay).await;
            }
        }

        self.controller.finish(None);
    }

    async fn process(&self, item: &TaskItem) {
        let outcome = AssertUnwindSafe(self.operation.apply(&self.params, item))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(MaintenanceError::per_record(
                    item.identifier(),
                    "operation panicked",
                ))
            });

        match outcome {
            Ok(true) => {
                self.controller.record_done();
                counter!("maintenance_records_total", "outcome" => "done").increment(1);
            }
            Ok(false) => {
                self.controller.record_skipped();
                counter!("maintenance_records_total", "outcome" => "skipped").increment(1);
            }
            Err(e) => {
                warn!(
                    "Maintenance task {} failed on {}: {}",
                    self.operation.name(),
                    item.identifier(),
                    e
                );
                self.controller.record_bad(item.identifier());
                counter!("maintenance_records_total", "outcome" => "bad").increment(1);
            }
        }
    }
}

#[async_trait]
impl Worker for MaintenanceWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        self.execute().await;
        Ok(())
    }

    fn name(&self) -> &str {
        self.operation.name()
    }
}
