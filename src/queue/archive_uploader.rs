// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::Record;
use crate::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use crate::domain::services::archive_upload_service::{ArchiveUploadService, UploadRequest};
use crate::utils::archive_table::render_table;
use crate::utils::errors::MaintenanceError;
use chrono::Utc;
use metrics::{counter, histogram};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// 归档上传器
///
/// 负责把一个批次渲染为表格文本、上传到归档服务，并在成功后
/// 把返回的内容地址写回影子行。失败时不修改任何影子行，
/// 由调用方把批次放回队列。
pub struct ArchiveUploader {
    service: Arc<dyn ArchiveUploadService>,
    shadows: Arc<dyn ArchiveShadowRepository>,
    file_name_prefix: String,
}

impl ArchiveUploader {
    pub fn new(
        service: Arc<dyn ArchiveUploadService>,
        shadows: Arc<dyn ArchiveShadowRepository>,
        file_name_prefix: impl Into<String>,
    ) -> Self {
        Self {
            service,
            shadows,
            file_name_prefix: file_name_prefix.into(),
        }
    }

    /// 构建上传请求
    ///
    /// 每次调用生成新的上传ID与32字节随机密钥材料
    pub fn build_request(&self, data_type: i32, batch: &[Record]) -> UploadRequest {
        let mut key = [0u8; 32];
        rand::rng().fill(&mut key);

        UploadRequest {
            upload_id: Uuid::new_v4().to_string(),
            key_material: hex::encode(key),
            file_content: render_table(batch),
            file_name: format!(
                "{}-{}-{}.txt",
                self.file_name_prefix,
                data_type,
                Utc::now().timestamp()
            ),
        }
    }

    /// 上传批次
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 内容地址
    /// * `Err(MaintenanceError::Upload)` - 上传失败，影子行保持未上传状态
    pub async fn upload(&self, data_type: i32, batch: &[Record]) -> Result<String, MaintenanceError> {
        let request = self.build_request(data_type, batch);
        let start = Instant::now();

        let result = self.service.upload(&request).await;
        histogram!("archive_upload_duration_seconds").record(start.elapsed().as_secs_f64());

        let address = result.map_err(|e| MaintenanceError::Upload(e.to_string()))?;
        info!(
            "Uploaded {} records of data type {} to {}",
            batch.len(),
            data_type,
            address
        );

        let uploaded_at = Utc::now();
        let mut updated = 0usize;
        for record in batch {
            match self
                .shadows
                .mark_uploaded(data_type, record.id, &address, uploaded_at)
                .await
            {
                Ok(true) => updated += 1,
                Ok(false) => {
                    warn!(
                        "Shadow row for record {} (data type {}) not found, skipping",
                        record.id, data_type
                    );
                    counter!("archive_shadow_missing_total").increment(1);
                }
                Err(e) => {
                    warn!(
                        "Failed to record archive address for record {} (data type {}): {}",
                        record.id, data_type, e
                    );
                    counter!("archive_shadow_update_failed_total").increment(1);
                }
            }
        }

        if updated < batch.len() {
            warn!(
                "Only {} of {} shadow rows updated for upload {}",
                updated,
                batch.len(),
                request.upload_id
            );
        }

        Ok(address)
    }
}
