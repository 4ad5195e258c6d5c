// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::archive_upload_service::{
    ArchiveUploadService, UploadRequest, UploadServiceError,
};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// 归档服务响应信封
#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<UploadEnvelopeData>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadEnvelopeData {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// 从响应信封生成错误信息
///
/// 优先使用顶层 `msg`，其次 `data.error`，两者都存在时用破折号连接，
/// 都不存在时退回到基于状态码的通用信息。
pub fn envelope_error_message(msg: Option<&str>, error: Option<&str>, status: i64) -> String {
    let msg = msg.map(str::trim).filter(|m| !m.is_empty());
    let error = error.map(str::trim).filter(|e| !e.is_empty());
    match (msg, error) {
        (Some(msg), Some(error)) => format!("{} — {}", msg, error),
        (Some(msg), None) => msg.to_string(),
        (None, Some(error)) => error.to_string(),
        (None, None) => format!("upload failed with status {}", status),
    }
}

/// 归档上传服务实现
///
/// 通过 HTTPS 把批次以 JSON 形式 POST 到归档服务
pub struct ArchiveUploadServiceImpl {
    /// HTTP 客户端
    client: Client,
    /// 上传地址
    upload_url: String,
}

impl ArchiveUploadServiceImpl {
    /// 创建新的归档上传服务实现
    pub fn new(upload_url: String, timeout: Duration) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("Archivrs-Uploader/0.1.0"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client, upload_url }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

#[async_trait]
impl ArchiveUploadService for ArchiveUploadServiceImpl {
    async fn upload(&self, request: &UploadRequest) -> Result<String, UploadServiceError> {
        debug!(
            "Uploading {} ({} bytes) to {}",
            request.file_name,
            request.file_content.len(),
            self.upload_url
        );

        let response = self
            .client
            .post(&self.upload_url)
            .json(request)
            .send()
            .await
            .map_err(|e| UploadServiceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadServiceError::Transport(e.to_string()))?;

        let envelope: UploadEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(UploadServiceError::MalformedResponse(e.to_string()))
            }
            Err(_) => {
                return Err(UploadServiceError::Rejected(envelope_error_message(
                    None,
                    None,
                    status.as_u16() as i64,
                )))
            }
        };

        let data = envelope.data.unwrap_or_default();
        if status.is_success() && envelope.code == 0 {
            return data
                .address
                .filter(|address| !address.trim().is_empty())
                .ok_or_else(|| {
                    UploadServiceError::MalformedResponse(
                        "response carries no archive address".to_string(),
                    )
                });
        }

        let status_code = if status.is_success() {
            envelope.code
        } else {
            status.as_u16() as i64
        };
        Err(UploadServiceError::Rejected(envelope_error_message(
            envelope.msg.as_deref(),
            data.error.as_deref(),
            status_code,
        )))
    }
}
