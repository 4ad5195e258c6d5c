// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 业务记录实体
///
/// 记录表由上游服务写入，维护任务与归档流水线只读取和修补
/// 其中的少量字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 记录ID，由上游分配
    pub id: i64,
    /// 关联ID，归档时必须存在
    pub correlation_id: Option<String>,
    /// 动作类型
    pub action: String,
    /// 所属分区
    pub section: String,
    /// 原始序列化负载
    pub object: String,
    /// 结构化负载，未填充时为空
    pub payload: Map<String, Value>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// 创建一个新的记录，结构化负载为空
    pub fn new(id: i64, action: &str, section: &str, object: &str) -> Self {
        Self {
            id,
            correlation_id: None,
            action: action.to_string(),
            section: section.to_string(),
            object: object.to_string(),
            payload: Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// 返回非空的关联ID
    pub fn correlation(&self) -> Option<&str> {
        self.correlation_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// 记录查询条件
///
/// 未设置的字段不参与过滤，结果总是按ID降序返回。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub action: Option<String>,
    pub section: Option<String>,
    pub ids: Option<Vec<i64>>,
}

impl RecordFilter {
    pub fn by_action_section(action: &str, section: &str) -> Self {
        Self {
            action: Some(action.to_string()),
            section: Some(section.to_string()),
            ids: None,
        }
    }

    /// 判断记录是否满足条件
    pub fn matches(&self, record: &Record) -> bool {
        self.action.as_ref().is_none_or(|a| *a == record.action)
            && self.section.as_ref().is_none_or(|s| *s == record.section)
            && self.ids.as_ref().is_none_or(|ids| ids.contains(&record.id))
    }
}
