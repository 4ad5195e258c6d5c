// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 归档影子行
///
/// 每条进入归档队列的记录都会持久化一行，上传成功后写入内容地址。
/// `(data_type, record_id)` 唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveShadowRow {
    pub id: Uuid,
    /// 被归档的记录ID
    pub record_id: i64,
    /// 记录的关联ID
    pub correlation_id: String,
    /// 归档分类
    pub data_type: i32,
    /// 内容地址，上传前为空
    pub archive_address: String,
    pub created_at: DateTime<Utc>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl ArchiveShadowRow {
    pub fn new(data_type: i32, record_id: i64, correlation_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            correlation_id: correlation_id.to_string(),
            data_type,
            archive_address: String::new(),
            created_at: Utc::now(),
            uploaded_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.archive_address.is_empty()
    }
}
