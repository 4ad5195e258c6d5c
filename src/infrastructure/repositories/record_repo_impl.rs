// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::{Record, RecordFilter};
use crate::domain::repositories::record_repository::{RecordRepository, RepositoryError};
use crate::infrastructure::database::entities::record;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use serde_json::{Map, Value};
use std::sync::Arc;

/// 记录仓库实现
#[derive(Clone)]
pub struct RecordRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl RecordRepositoryImpl {
    /// 创建新的记录仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 写入一条记录
    ///
    /// 记录通常由上游服务写入，这里主要供初始化数据与测试使用
    pub async fn insert(&self, record: &Record) -> Result<Record, RepositoryError> {
        let active_model = record::ActiveModel {
            id: Set(record.id),
            correlation_id: Set(record.correlation_id.clone()),
            action: Set(record.action.clone()),
            section: Set(record.section.clone()),
            object: Set(record.object.clone()),
            payload: Set(Value::Object(record.payload.clone())),
            created_at: Set(record.created_at.into()),
        };

        record::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(record.clone())
    }
}

impl From<record::Model> for Record {
    fn from(model: record::Model) -> Self {
        Self {
            id: model.id,
            correlation_id: model.correlation_id,
            action: model.action,
            section: model.section,
            object: model.object,
            payload: match model.payload {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

fn string_field(key: &str, value: &Value) -> Result<String, RepositoryError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RepositoryError::InvalidParameter(format!("`{}` must be a string", key)))
}

#[async_trait]
impl RecordRepository for RecordRepositoryImpl {
    async fn find_by_filter(&self, filter: &RecordFilter) -> Result<Vec<Record>, RepositoryError> {
        let mut query = record::Entity::find();

        if let Some(action) = &filter.action {
            query = query.filter(record::Column::Action.eq(action.clone()));
        }
        if let Some(section) = &filter.section {
            query = query.filter(record::Column::Section.eq(section.clone()));
        }
        if let Some(ids) = &filter.ids {
            query = query.filter(record::Column::Id.is_in(ids.clone()));
        }

        let models = query
            .order_by_desc(record::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Record>, RepositoryError> {
        let model = record::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(Into::into))
    }

    async fn update_fields(
        &self,
        id: i64,
        fields: Map<String, Value>,
    ) -> Result<bool, RepositoryError> {
        let Some(model) = record::Entity::find_by_id(id).one(self.db.as_ref()).await? else {
            return Ok(false);
        };
        if fields.is_empty() {
            return Ok(true);
        }

        let mut active: record::ActiveModel = model.into();
        for (key, value) in fields {
            match key.as_str() {
                "payload" => {
                    if !value.is_object() {
                        return Err(RepositoryError::InvalidParameter(
                            "`payload` must be a JSON object".to_string(),
                        ));
                    }
                    active.payload = Set(value);
                }
                "object" => active.object = Set(string_field(&key, &value)?),
                "action" => active.action = Set(string_field(&key, &value)?),
                "section" => active.section = Set(string_field(&key, &value)?),
                "correlation_id" => {
                    active.correlation_id = Set(value.as_str().map(str::to_string))
                }
                other => {
                    return Err(RepositoryError::InvalidParameter(format!(
                        "unknown record field `{}`",
                        other
                    )))
                }
            }
        }

        active.update(self.db.as_ref()).await?;
        Ok(true)
    }
}
