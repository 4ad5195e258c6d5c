// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 上传请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// 本次上传的唯一ID
    pub upload_id: String,
    /// 随机生成的密钥材料（十六进制）
    pub key_material: String,
    /// 序列化后的批次内容
    pub file_content: String,
    /// 文件名
    pub file_name: String,
}

/// 上传服务错误
#[derive(Error, Debug)]
pub enum UploadServiceError {
    /// 网络或传输错误
    #[error("Transport error: {0}")]
    Transport(String),
    /// 归档服务返回失败
    #[error("Archive service rejected upload: {0}")]
    Rejected(String),
    /// 响应无法解析
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// 归档上传服务特质
///
/// 定义与外部内容寻址存储服务交互的接口
#[async_trait]
pub trait ArchiveUploadService: Send + Sync {
    /// 上传一个批次
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 归档服务返回的内容地址
    /// * `Err(UploadServiceError)` - 上传失败
    async fn upload(&self, request: &UploadRequest) -> Result<String, UploadServiceError>;
}
