// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 后台工作器
///
/// 维护任务工作器与归档定时上传工作器都实现此trait
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// 运行工作器直到结束
    async fn run(&self) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;

    /// 在后台运行，退出时记录结果
    fn start(self) -> JoinHandle<()>
    where
        Self: Sized,
    {
        tokio::spawn(async move {
            match self.run().await {
                Ok(()) => info!("{} stopped", self.name()),
                Err(e) => error!("{} failed: {}", self.name(), e),
            }
        })
    }
}
