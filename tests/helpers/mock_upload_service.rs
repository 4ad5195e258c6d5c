// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use archivrs::domain::services::archive_upload_service::{
    ArchiveUploadService, UploadRequest, UploadServiceError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// 可控的归档服务替身
///
/// 记录每次请求；可切换为失败；设置闸门后上传会阻塞到闸门打开。
pub struct MockUploadService {
    address: String,
    calls: AtomicUsize,
    requests: Mutex<Vec<UploadRequest>>,
    failing: AtomicBool,
    gate: Option<Arc<Notify>>,
    entered: Arc<Notify>,
}

impl MockUploadService {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            gate: None,
            entered: Arc::new(Notify::new()),
        }
    }

    pub fn failing() -> Self {
        let service = Self::new("unused");
        service.set_failing(true);
        service
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().clone()
    }

    /// 等待下一次上传进入服务
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl ArchiveUploadService for MockUploadService {
    async fn upload(&self, request: &UploadRequest) -> Result<String, UploadServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(UploadServiceError::Rejected(
                "archive service unavailable".to_string(),
            ));
        }
        Ok(self.address.clone())
    }
}
