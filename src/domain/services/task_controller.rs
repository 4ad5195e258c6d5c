// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::maintenance_task::{TaskParams, TaskStateView, TaskStatus};
use crate::utils::errors::MaintenanceError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// 任务槽位内部状态
///
/// 只能通过 `TaskController` 的方法访问。
#[derive(Debug)]
struct TaskState {
    status: TaskStatus,
    task_id: String,
    task_type: String,
    created_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    total_count: i64,
    done_count: i64,
    skipped_count: i64,
    bad_records: Vec<String>,
    last_error: String,
    is_test_run: bool,
    cancel_requested: bool,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            status: TaskStatus::Idle,
            task_id: String::new(),
            task_type: String::new(),
            created_at: None,
            finished_at: None,
            total_count: -1,
            done_count: 0,
            skipped_count: 0,
            bad_records: Vec::new(),
            last_error: String::new(),
            is_test_run: false,
            cancel_requested: false,
        }
    }
}

/// 维护任务控制器
///
/// 持有单一任务槽位，保证同一时刻最多只有一个任务处于
/// preparing 或 running 状态。所有读写都在一把互斥锁内完成，
/// 锁从不跨越 `.await`。
///
/// 生产环境每个进程一个实例，测试中可以创建多个互相隔离的实例。
#[derive(Debug, Default)]
pub struct TaskController {
    state: Mutex<TaskState>,
}

impl TaskController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否可以启动新任务
    pub fn can_start(&self) -> bool {
        !self.state.lock().status.is_active()
    }

    /// 占用任务槽位
    ///
    /// 在同一次加锁内完成检查与重置，槽位被占用时返回 `Conflict`
    /// 且不修改现有任务的任何字段。
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 新任务ID
    /// * `Err(MaintenanceError::Conflict)` - 已有任务在运行
    pub fn begin(&self, operation: &str, params: &TaskParams) -> Result<String, MaintenanceError> {
        let mut state = self.state.lock();
        if state.status.is_active() {
            return Err(MaintenanceError::Conflict(format!(
                "task {} is still {}",
                state.task_type, state.status
            )));
        }

        let task_id = Uuid::new_v4().to_string();
        *state = TaskState {
            status: TaskStatus::Preparing,
            task_type: format!("{}-{}", operation, task_id),
            task_id: task_id.clone(),
            created_at: Some(Utc::now()),
            is_test_run: params.is_test(),
            ..TaskState::default()
        };

        info!(
            "Maintenance task {} created (test run: {})",
            state.task_type, state.is_test_run
        );
        Ok(task_id)
    }

    /// 请求停止当前任务
    ///
    /// 只设置标志位，不修改状态也不阻塞；运行中的任务在下一条记录前
    /// 观察到标志后自行结束。
    pub fn request_stop(&self) -> Result<(), MaintenanceError> {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Idle {
            return Err(MaintenanceError::NotFound(
                "no maintenance task has been created".to_string(),
            ));
        }
        state.cancel_requested = true;
        info!("Stop requested for task {}", state.task_type);
        Ok(())
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.state.lock().cancel_requested
    }

    /// 获取状态快照
    pub fn snapshot(&self) -> TaskStateView {
        let state = self.state.lock();
        TaskStateView {
            status: state.status,
            task_id: state.task_id.clone(),
            task_type: state.task_type.clone(),
            total_count: state.total_count,
            done_count: state.done_count,
            skipped_count: state.skipped_count,
            bad_records: state.bad_records.clone(),
            last_error: state.last_error.clone(),
            is_test_run: state.is_test_run,
            cancel_requested: state.cancel_requested,
            created_at: state.created_at,
            finished_at: state.finished_at,
        }
    }

    /// 选择完成，进入 running 并写入总数
    pub fn mark_running(&self, total: usize) {
        let mut state = self.state.lock();
        if state.status != TaskStatus::Preparing {
            warn!(
                "Ignoring running transition for task {} in state {}",
                state.task_type, state.status
            );
            return;
        }
        state.status = TaskStatus::Running;
        state.total_count = total as i64;
    }

    /// 记录一次成功的修改
    pub fn record_done(&self) {
        let mut state = self.state.lock();
        if state.status != TaskStatus::Running {
            return;
        }
        if state.total_count >= 0 && state.done_count >= state.total_count {
            warn!("done count of task {} already at total", state.task_type);
            return;
        }
        state.done_count += 1;
    }

    /// 记录一条无需修改的记录
    pub fn record_skipped(&self) {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Running {
            state.skipped_count += 1;
        }
    }

    /// 记录一条处理失败的记录
    pub fn record_bad(&self, identifier: String) {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Running {
            state.bad_records.push(identifier);
        }
    }

    /// 结束任务
    ///
    /// `error` 为致命错误信息；结束后计数器不再变化。
    pub fn finish(&self, error: Option<String>) {
        let mut state = self.state.lock();
        if !state.status.is_active() {
            return;
        }
        state.status = TaskStatus::Finished;
        state.finished_at = Some(Utc::now());
        if let Some(error) = error {
            state.last_error = error;
        }
        info!(
            "Maintenance task {} finished: done={} skipped={} bad={} total={}",
            state.task_type,
            state.done_count,
            state.skipped_count,
            state.bad_records.len(),
            state.total_count
        );
    }
}
