// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 内置维护操作模块
///
/// - 修复记录结构化负载（fix_record_object）
/// - 重新入队未归档记录（requeue_pending_archives）
/// - 写入已知归档地址（assign_archive_address）
pub mod assign_archive_address;
pub mod fix_record_object;
pub mod requeue_pending_archives;

pub use assign_archive_address::AssignArchiveAddress;
pub use fix_record_object::FixRecordObject;
pub use requeue_pending_archives::RequeuePendingArchives;
