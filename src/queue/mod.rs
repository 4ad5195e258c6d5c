// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供归档批处理队列
/// 负责待归档记录的去重、阈值触发与失败回填
pub mod archive_queue;
pub mod archive_uploader;

pub use archive_queue::{ArchiveQueue, EnqueueOutcome, FlushHandle, FlushOutcome};
pub use archive_uploader::ArchiveUploader;
