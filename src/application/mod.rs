// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含内置维护操作与对外暴露的用例
pub mod operations;
pub mod use_cases;
