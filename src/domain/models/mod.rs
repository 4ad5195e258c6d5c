// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 记录（record）：由上游写入、由维护任务修补的业务记录
/// - 归档（archive）：归档影子行
/// - 维护任务（maintenance_task）：任务状态、参数与快照
pub mod archive;
pub mod maintenance_task;
pub mod record;
