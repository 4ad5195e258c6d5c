// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::archive::ArchiveShadowRow;
use crate::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use crate::domain::repositories::record_repository::RepositoryError;
use crate::infrastructure::database::entities::archive_shadow_row;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::sync::Arc;

/// 归档影子行仓库实现
#[derive(Clone)]
pub struct ArchiveShadowRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ArchiveShadowRepositoryImpl {
    /// 创建新的归档影子行仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        data_type: i32,
        record_id: i64,
    ) -> Result<Option<archive_shadow_row::Model>, RepositoryError> {
        let model = archive_shadow_row::Entity::find()
            .filter(archive_shadow_row::Column::DataType.eq(data_type))
            .filter(archive_shadow_row::Column::RecordId.eq(record_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model)
    }
}

impl From<archive_shadow_row::Model> for ArchiveShadowRow {
    fn from(model: archive_shadow_row::Model) -> Self {
        Self {
            id: model.id,
            record_id: model.record_id,
            correlation_id: model.correlation_id,
            data_type: model.data_type,
            archive_address: model.archive_address,
            created_at: model.created_at.with_timezone(&Utc),
            uploaded_at: model.uploaded_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[async_trait]
impl ArchiveShadowRepository for ArchiveShadowRepositoryImpl {
    async fn insert_if_absent(&self, row: &ArchiveShadowRow) -> Result<bool, RepositoryError> {
        if self.find_model(row.data_type, row.record_id).await?.is_some() {
            return Ok(false);
        }

        let active_model = archive_shadow_row::ActiveModel {
            id: Set(row.id),
            record_id: Set(row.record_id),
            correlation_id: Set(row.correlation_id.clone()),
            data_type: Set(row.data_type),
            archive_address: Set(row.archive_address.clone()),
            created_at: Set(row.created_at.into()),
            uploaded_at: Set(row.uploaded_at.map(Into::into)),
        };

        match archive_shadow_row::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await
        {
            Ok(_) => Ok(true),
            // Lost a race with a concurrent insert of the same pair
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(
        &self,
        data_type: i32,
        record_id: i64,
    ) -> Result<Option<ArchiveShadowRow>, RepositoryError> {
        Ok(self.find_model(data_type, record_id).await?.map(Into::into))
    }

    async fn find_pending(
        &self,
        data_type: Option<i32>,
    ) -> Result<Vec<ArchiveShadowRow>, RepositoryError> {
        let mut query = archive_shadow_row::Entity::find()
            .filter(archive_shadow_row::Column::ArchiveAddress.eq(""));

        if let Some(data_type) = data_type {
            query = query.filter(archive_shadow_row::Column::DataType.eq(data_type));
        }

        let models = query
            .order_by_desc(archive_shadow_row::Column::RecordId)
            .order_by_asc(archive_shadow_row::Column::DataType)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn mark_uploaded(
        &self,
        data_type: i32,
        record_id: i64,
        address: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let Some(model) = self.find_model(data_type, record_id).await? else {
            return Ok(false);
        };

        let mut active: archive_shadow_row::ActiveModel = model.into();
        active.archive_address = Set(address.to_string());
        active.uploaded_at = Set(Some(uploaded_at.into()));
        active.update(self.db.as_ref()).await?;

        Ok(true)
    }
}
