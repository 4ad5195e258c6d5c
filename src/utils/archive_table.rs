// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::Record;
use serde_json::Value;
use std::collections::BTreeSet;

/// 缺失字段占位符
pub const MISSING_PLACEHOLDER: &str = "--";
/// 空值占位符
pub const EMPTY_PLACEHOLDER: &str = "-";
/// 换行替换标记
pub const LINE_BREAK_MARKER: &str = "<br>";
/// 全星号字段名的折叠结果
pub const STAR_SENTINEL: &str = "*";

/// 将批次渲染为以空格分隔的表格文本
///
/// 第一行是所有记录结构化负载字段名的并集（升序），之后每条记录一行，
/// 记录按ID升序排列，保证同一批次总是得到相同的输出。
pub fn render_table(records: &[Record]) -> String {
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.payload.keys().map(String::as_str))
        .collect();

    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by_key(|record| record.id);

    let mut lines = Vec::with_capacity(ordered.len() + 1);
    lines.push(
        keys.iter()
            .map(|key| escape_key(key))
            .collect::<Vec<_>>()
            .join(" "),
    );

    for record in ordered {
        let row = keys
            .iter()
            .map(|key| match record.payload.get(*key) {
                None => MISSING_PLACEHOLDER.to_string(),
                Some(value) => render_value(value),
            })
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(row);
    }

    lines.join("\n")
}

fn render_value(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }
    escape(&text)
}

fn escape_key(key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c == '*') {
        return STAR_SENTINEL.to_string();
    }
    if key.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }
    escape(key)
}

fn escape(text: &str) -> String {
    text.replace("\r\n", LINE_BREAK_MARKER)
        .replace(['\n', '\r'], LINE_BREAK_MARKER)
        .replace(' ', "-")
}
