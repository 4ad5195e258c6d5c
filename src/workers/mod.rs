// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台任务处理功能
/// 包括维护任务执行与归档定时上传
pub mod archive_flush_worker;
pub mod maintenance_worker;
pub mod worker;

pub use worker::Worker;
