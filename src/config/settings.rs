// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含数据库、维护任务、归档流水线、指标与日志等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 维护任务配置
    pub maintenance: MaintenanceSettings,
    /// 归档配置
    pub archive: ArchiveSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub telemetry: TelemetrySettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 维护任务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceSettings {
    /// 两条记录之间的间隔（毫秒），0 表示不等待
    pub record_delay_ms: u64,
    /// 试运行时最多处理的记录数
    pub test_run_limit: usize,
}

impl MaintenanceSettings {
    pub fn record_delay(&self) -> Duration {
        Duration::from_millis(self.record_delay_ms)
    }
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        Self {
            record_delay_ms: 100,
            test_run_limit: 10,
        }
    }
}

/// 归档配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSettings {
    /// 归档服务上传地址
    pub upload_url: String,
    /// 单个分类触发上传的队列长度
    pub flush_threshold: usize,
    /// 定时上传间隔（秒）
    pub flush_interval_secs: u64,
    /// 上传请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 上传文件名前缀
    pub file_name_prefix: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            upload_url: "https://localhost:8443/api/v1/archive/upload".to_string(),
            flush_threshold: 1000,
            flush_interval_secs: 300,
            request_timeout_secs: 30,
            file_name_prefix: "archive".to_string(),
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 监听地址
    pub listen_addr: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// 是否输出 JSON 日志
    pub json: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default DB settings
            .set_default("database.url", "sqlite://archivrs.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default maintenance settings
            .set_default("maintenance.record_delay_ms", 100)?
            .set_default("maintenance.test_run_limit", 10)?
            // Default archive settings
            .set_default(
                "archive.upload_url",
                "https://localhost:8443/api/v1/archive/upload",
            )?
            .set_default("archive.flush_threshold", 1000)?
            .set_default("archive.flush_interval_secs", 300)?
            .set_default("archive.request_timeout_secs", 30)?
            .set_default("archive.file_name_prefix", "archive")?
            // Default observability settings
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .set_default("telemetry.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("ARCHIVRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
