// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 任务控制器（task_controller）：单任务槽位与状态机
/// - 维护操作（maintenance_operation）：逐条修补操作的契约
/// - 归档上传服务（archive_upload_service）：外部归档服务的契约
pub mod archive_upload_service;
pub mod maintenance_operation;
pub mod task_controller;
