// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::archive_queue::{ArchiveQueue, FlushOutcome};
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// 归档定时上传工作器
///
/// 定期上传所有非空分类，未达到阈值的分类也能按时归档。
///
/// 停机信号只在两轮上传之间生效，进行中的上传总会完成。
pub struct ArchiveFlushWorker {
    queue: ArchiveQueue,
    period: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ArchiveFlushWorker {
    /// # 参数
    ///
    /// * `queue` - 归档队列
    /// * `period` - 上传间隔，最短 1 秒
    /// * `shutdown` - 值变为 `true` 或发送端被丢弃时停止
    pub fn new(queue: ArchiveQueue, period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            queue,
            period: period.max(Duration::from_secs(1)),
            shutdown,
        }
    }

    /// 执行一轮上传
    ///
    /// # 返回值
    ///
    /// 本轮成功上传的记录数
    pub async fn flush_once(&self) -> usize {
        let mut uploaded = 0;
        for (data_type, result) in self.queue.flush_all().await {
            match result {
                Ok(FlushOutcome::Uploaded { count, address }) => {
                    info!(
                        "Periodic flush archived {} records of data type {} at {}",
                        count, data_type, address
                    );
                    uploaded += count;
                }
                Ok(FlushOutcome::NoOp) => {}
                Err(e) => error!("Periodic flush of data type {} failed: {}", data_type, e),
            }
        }
        uploaded
    }
}

#[async_trait]
impl Worker for ArchiveFlushWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Archive flush worker started (every {:?})", self.period);
        let mut shutdown = self.shutdown.clone();
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        while !*shutdown.borrow_and_update() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Archive flush worker received shutdown signal");
        Ok(())
    }

    fn name(&self) -> &str {
        "archive_flush_worker"
    }
}
