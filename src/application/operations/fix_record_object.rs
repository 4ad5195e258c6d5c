// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::maintenance_task::{TaskItem, TaskParams};
use crate::domain::models::record::RecordFilter;
use crate::domain::repositories::record_repository::RecordRepository;
use crate::domain::services::maintenance_operation::MaintenanceOperation;
use crate::utils::errors::MaintenanceError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// 修复记录结构化负载
///
/// 选取指定 action/section 的记录，把原始 `object` 文本解析为 JSON 对象
/// 写入 `payload`。已填充的记录视为无需修改。
pub struct FixRecordObject {
    records: Arc<dyn RecordRepository>,
}

impl FixRecordObject {
    pub const NAME: &'static str = "fixRecordObject";

    pub fn new(records: Arc<dyn RecordRepository>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl MaintenanceOperation for FixRecordObject {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn validate(&self, params: &TaskParams) -> Result<(), MaintenanceError> {
        params.require_str("action")?;
        params.require_str("section")?;
        Ok(())
    }

    async fn select(&self, params: &TaskParams) -> Result<Vec<TaskItem>, MaintenanceError> {
        let (Some(action), Some(section)) = (params.action(), params.section()) else {
            return Err(MaintenanceError::Validation(
                "action and section are required".to_string(),
            ));
        };
        let filter = RecordFilter::by_action_section(action, section);

        let records = self
            .records
            .find_by_filter(&filter)
            .await
            .map_err(|e| MaintenanceError::Selection(e.to_string()))?;

        Ok(records.into_iter().map(TaskItem::Record).collect())
    }

    async fn apply(&self, _params: &TaskParams, item: &TaskItem) -> Result<bool, MaintenanceError> {
        let TaskItem::Record(record) = item else {
            return Err(MaintenanceError::per_record(
                item.identifier(),
                "expected a record",
            ));
        };

        if !record.payload.is_empty() {
            return Ok(false);
        }

        let parsed = match serde_json::from_str::<Value>(&record.object) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(MaintenanceError::per_record(
                    record.id,
                    "object is not a JSON object",
                ))
            }
            Err(e) => {
                return Err(MaintenanceError::per_record(
                    record.id,
                    format!("malformed object: {}", e),
                ))
            }
        };

        if parsed.is_empty() {
            return Ok(false);
        }

        let mut fields = Map::new();
        fields.insert("payload".to_string(), Value::Object(parsed));

        match self.records.update_fields(record.id, fields).await {
            Ok(true) => Ok(true),
            Ok(false) => Err(MaintenanceError::NotFound(format!("record {}", record.id))),
            Err(e) => Err(MaintenanceError::per_record(record.id, e)),
        }
    }
}
