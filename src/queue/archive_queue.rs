// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::archive::ArchiveShadowRow;
use crate::domain::models::record::Record;
use crate::domain::repositories::archive_shadow_repository::ArchiveShadowRepository;
use crate::queue::archive_uploader::ArchiveUploader;
use crate::utils::errors::MaintenanceError;
use metrics::counter;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 默认触发上传的队列长度
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1000;

/// 一次上传的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 队列为空，没有发生上传
    NoOp,
    /// 上传成功
    Uploaded { address: String, count: usize },
}

/// 后台上传任务句柄
///
/// 调用方可以直接丢弃；测试用它等待上传结束。
pub struct FlushHandle {
    data_type: i32,
    handle: JoinHandle<Result<FlushOutcome, MaintenanceError>>,
}

impl FlushHandle {
    pub fn data_type(&self) -> i32 {
        self.data_type
    }

    /// 等待上传结束
    pub async fn wait(self) -> Result<FlushOutcome, MaintenanceError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(MaintenanceError::Upload(format!(
                "flush task for data type {} aborted: {}",
                self.data_type, e
            ))),
        }
    }
}

/// 入队结果
pub struct EnqueueOutcome {
    /// 记录是否是新加入内存队列的
    pub inserted: bool,
    /// 本次入队触发的后台上传
    pub flush: Option<FlushHandle>,
}

#[derive(Default)]
struct QueueState {
    categories: HashMap<i32, HashMap<i64, Record>>,
    /// 已调度但尚未取走批次的分类
    scheduled: HashSet<i32>,
    /// 正在上传的记录ID，上传成功或批次放回后清除
    in_flight: HashMap<i32, HashSet<i64>>,
}

impl QueueState {
    fn is_in_flight(&self, data_type: i32, record_id: i64) -> bool {
        self.in_flight
            .get(&data_type)
            .is_some_and(|ids| ids.contains(&record_id))
    }

    fn release(&mut self, data_type: i32, batch: &[Record]) {
        if let Some(ids) = self.in_flight.get_mut(&data_type) {
            for record in batch {
                ids.remove(&record.id);
            }
            if ids.is_empty() {
                self.in_flight.remove(&data_type);
            }
        }
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    shadows: Arc<dyn ArchiveShadowRepository>,
    uploader: ArchiveUploader,
    threshold: usize,
}

/// 归档队列
///
/// 按分类（data type）维护待归档记录的集合，以记录ID去重。
/// 每条入队记录同时持久化一行影子行。某个分类达到阈值时在后台
/// 触发上传；上传在锁外进行，失败时整批放回队列。
/// 上传中的记录再次入队不会进入内存集合，同一条记录不会同时出现在两个批次里。
///
/// 所有分类共用一把锁，临界区只包含 map 操作。
#[derive(Clone)]
pub struct ArchiveQueue {
    inner: Arc<QueueInner>,
}

impl ArchiveQueue {
    pub fn new(
        shadows: Arc<dyn ArchiveShadowRepository>,
        uploader: ArchiveUploader,
        threshold: usize,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                shadows,
                uploader,
                threshold: threshold.max(1),
            }),
        }
    }

    pub fn threshold(&self) -> usize {
        self.inner.threshold
    }

    /// 记录入队
    ///
    /// # 参数
    ///
    /// * `data_type` - 归档分类
    /// * `record` - 记录快照，必须带有关联ID
    ///
    /// # 返回值
    ///
    /// * `Ok(EnqueueOutcome)` - 入队成功，可能附带一个后台上传句柄
    /// * `Err(MaintenanceError::Validation)` - 记录缺少关联ID
    /// * `Err(MaintenanceError::Repository)` - 影子行写入失败
    pub async fn add(
        &self,
        data_type: i32,
        record: Record,
    ) -> Result<EnqueueOutcome, MaintenanceError> {
        let correlation_id = record
            .correlation()
            .ok_or_else(|| {
                MaintenanceError::Validation(format!(
                    "record {} has no correlation id",
                    record.id
                ))
            })?
            .to_string();

        let row = ArchiveShadowRow::new(data_type, record.id, &correlation_id);
        if self.inner.shadows.insert_if_absent(&row).await? {
            debug!(
                "Created shadow row for record {} (data type {})",
                record.id, data_type
            );
        }

        let (inserted, trigger) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let in_flight = state.is_in_flight(data_type, record.id);
            let set = state.categories.entry(data_type).or_default();
            let inserted = match set.entry(record.id) {
                Entry::Vacant(_) if in_flight => false,
                Entry::Vacant(slot) => {
                    slot.insert(record);
                    true
                }
                Entry::Occupied(_) => false,
            };
            let reached = set.len() >= self.inner.threshold;
            (inserted, reached && state.scheduled.insert(data_type))
        };

        if inserted {
            counter!("archive_enqueued_total").increment(1);
        }

        let flush = trigger.then(|| {
            info!(
                "Data type {} reached threshold {}, scheduling flush",
                data_type, self.inner.threshold
            );
            self.spawn_flush(data_type)
        });

        Ok(EnqueueOutcome { inserted, flush })
    }

    /// 从内存队列移除记录，不影响影子行
    pub fn remove(&self, data_type: i32, record_id: i64) -> bool {
        let mut state = self.inner.state.lock();
        state
            .categories
            .get_mut(&data_type)
            .is_some_and(|set| set.remove(&record_id).is_some())
    }

    pub fn size(&self, data_type: i32) -> usize {
        let state = self.inner.state.lock();
        state.categories.get(&data_type).map_or(0, HashMap::len)
    }

    /// 记录是否在队列中，包括正在上传的批次
    pub fn contains(&self, data_type: i32, record_id: i64) -> bool {
        let state = self.inner.state.lock();
        state
            .categories
            .get(&data_type)
            .is_some_and(|set| set.contains_key(&record_id))
            || state.is_in_flight(data_type, record_id)
    }

    /// 各分类的队列长度，省略空分类
    pub fn sizes_by_category(&self) -> HashMap<i32, usize> {
        let state = self.inner.state.lock();
        state
            .categories
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(data_type, set)| (*data_type, set.len()))
            .collect()
    }

    /// 在后台执行一次上传
    pub fn spawn_flush(&self, data_type: i32) -> FlushHandle {
        let queue = self.clone();
        let handle = tokio::spawn(async move {
            let result = queue.flush(data_type).await;
            if let Err(e) = &result {
                error!("Background flush of data type {} failed: {}", data_type, e);
            }
            result
        });
        FlushHandle { data_type, handle }
    }

    /// 上传一个分类的全部记录
    ///
    /// 在锁内把分类集合换成空集合并登记批次中的记录ID，释放锁后再上传。
    /// 上传失败时批次原样放回队列并返回错误。
    pub async fn flush(&self, data_type: i32) -> Result<FlushOutcome, MaintenanceError> {
        let batch: Vec<Record> = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            state.scheduled.remove(&data_type);
            let batch: Vec<Record> = state
                .categories
                .get_mut(&data_type)
                .map(|set| std::mem::take(set).into_values().collect())
                .unwrap_or_default();
            if !batch.is_empty() {
                state
                    .in_flight
                    .entry(data_type)
                    .or_default()
                    .extend(batch.iter().map(|record| record.id));
            }
            batch
        };

        if batch.is_empty() {
            counter!("archive_flush_total", "outcome" => "noop").increment(1);
            return Ok(FlushOutcome::NoOp);
        }

        let count = batch.len();
        info!("Flushing {} records of data type {}", count, data_type);

        match self.inner.uploader.upload(data_type, &batch).await {
            Ok(address) => {
                self.inner.state.lock().release(data_type, &batch);
                counter!("archive_flush_total", "outcome" => "uploaded").increment(1);
                Ok(FlushOutcome::Uploaded { address, count })
            }
            Err(e) => {
                error!(
                    "Upload of {} records of data type {} failed, restoring batch: {}",
                    count, data_type, e
                );
                self.restore(data_type, batch);
                counter!("archive_flush_total", "outcome" => "restored").increment(1);
                Err(e)
            }
        }
    }

    /// 上传所有非空分类
    pub async fn flush_all(&self) -> Vec<(i32, Result<FlushOutcome, MaintenanceError>)> {
        let categories: Vec<i32> = self.sizes_by_category().into_keys().collect();
        let flushes = categories.into_iter().map(|data_type| async move {
            (data_type, self.flush(data_type).await)
        });
        futures::future::join_all(flushes).await
    }

    /// 把失败的批次放回队列，已有的同ID记录优先保留
    ///
    /// 解除登记和放回在同一个临界区内完成。
    fn restore(&self, data_type: i32, batch: Vec<Record>) {
        let mut state = self.inner.state.lock();
        state.release(data_type, &batch);
        let set = state.categories.entry(data_type).or_default();
        for record in batch {
            set.entry(record.id).or_insert(record);
        }
    }
}
