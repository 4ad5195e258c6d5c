// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 记录仓库（record_repository）：外部业务记录的查询与字段更新
/// - 归档影子行仓库（archive_shadow_repository）：归档进度的持久化
pub mod archive_shadow_repository;
pub mod record_repository;
