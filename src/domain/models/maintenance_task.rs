// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::archive::ArchiveShadowRow;
use crate::domain::models::record::Record;
use crate::utils::errors::MaintenanceError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// 维护任务状态枚举
///
/// 状态转换遵循以下流程：
/// Idle → Preparing → Running → Finished
///
/// Preparing 阶段失败时直接进入 Finished，不经过 Running。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 空闲，进程内尚未创建过任务
    #[default]
    Idle,
    /// 准备中，正在解析参数并查询候选记录
    Preparing,
    /// 运行中，逐条处理候选记录
    Running,
    /// 已结束，直到下一次创建任务前不再变化
    Finished,
}

impl TaskStatus {
    /// 是否占用单任务槽位
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Preparing | TaskStatus::Running)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Idle => write!(f, "idle"),
            TaskStatus::Preparing => write!(f, "preparing"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Finished => write!(f, "finished"),
        }
    }
}

/// 维护任务参数
///
/// 保留调用方传入的原始 JSON 对象，各操作按需读取自己的字段，
/// 未识别的字段被忽略。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskParams {
    raw: Map<String, Value>,
}

impl TaskParams {
    /// 解析参数 JSON
    ///
    /// 空字符串视为空对象；非法 JSON 或非对象值返回校验错误。
    pub fn parse(params_json: &str) -> Result<Self, MaintenanceError> {
        if params_json.trim().is_empty() {
            return Ok(Self::default());
        }

        match serde_json::from_str::<Value>(params_json) {
            Ok(Value::Object(raw)) => Ok(Self { raw }),
            Ok(other) => Err(MaintenanceError::Validation(format!(
                "params must be a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(MaintenanceError::Validation(format!(
                "malformed params: {}",
                e
            ))),
        }
    }

    /// 读取非空字符串字段
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.raw
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// 读取必填字符串字段
    pub fn require_str(&self, key: &str) -> Result<&str, MaintenanceError> {
        self.str_field(key)
            .ok_or_else(|| MaintenanceError::Validation(format!("missing required field `{}`", key)))
    }

    /// 读取整数字段，接受数字或数字字符串
    pub fn int_field(&self, key: &str) -> Result<Option<i64>, MaintenanceError> {
        match self.raw.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
                MaintenanceError::Validation(format!("field `{}` must be an integer", key))
            }),
            Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
                MaintenanceError::Validation(format!("field `{}` must be an integer", key))
            }),
            Some(_) => Err(MaintenanceError::Validation(format!(
                "field `{}` must be an integer",
                key
            ))),
        }
    }

    /// 读取可选的归档分类 `dataType`，超出 i32 范围视为参数错误
    pub fn data_type(&self) -> Result<Option<i32>, MaintenanceError> {
        self.int_field("dataType")?
            .map(|value| {
                i32::try_from(value).map_err(|_| {
                    MaintenanceError::Validation(format!(
                        "field `dataType` is out of range: {}",
                        value
                    ))
                })
            })
            .transpose()
    }

    pub fn action(&self) -> Option<&str> {
        self.str_field("action")
    }

    pub fn section(&self) -> Option<&str> {
        self.str_field("section")
    }

    pub fn ipfs_address(&self) -> Option<&str> {
        self.str_field("ipfsAddress")
    }

    /// 是否为试运行
    ///
    /// 接受布尔 `true`、字符串 `"true"`/`"1"` 或数字 `1`，其余情况为 false。
    pub fn is_test(&self) -> bool {
        match self.raw.get("isTest") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true" || s == "1",
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            _ => false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 候选项
///
/// 维护操作可以作用于业务记录，也可以作用于归档影子行。
#[derive(Debug, Clone, PartialEq)]
pub enum TaskItem {
    Record(Record),
    Shadow(ArchiveShadowRow),
}

impl TaskItem {
    /// 写入坏记录列表时使用的标识
    pub fn identifier(&self) -> String {
        match self {
            TaskItem::Record(record) => record.id.to_string(),
            TaskItem::Shadow(row) => row.record_id.to_string(),
        }
    }
}

/// 任务状态快照
///
/// 供轮询使用的不可变副本。`badRecords` 在 JSON 中以分号连接，
/// 与既有客户端保持兼容。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateView {
    pub status: TaskStatus,
    pub task_id: String,
    pub task_type: String,
    pub total_count: i64,
    pub done_count: i64,
    pub skipped_count: i64,
    #[serde(serialize_with = "join_semicolon")]
    pub bad_records: Vec<String>,
    pub last_error: String,
    pub is_test_run: bool,
    pub cancel_requested: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

fn join_semicolon<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&items.join(";"))
}
