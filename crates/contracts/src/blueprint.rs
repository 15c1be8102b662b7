//! RowcastBlueprint - Config Loader 输出
//!
//! 描述完整的运行配置：列绑定、大小上限、过滤策略、存储位置、消息网关与操作员。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::UnparseableDatePolicy;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowcastBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 列绑定 (表头名称)
    pub columns: ColumnBindings,

    /// 文件大小与预览上限
    #[serde(default)]
    pub limits: LimitsConfig,

    /// 过滤策略
    #[serde(default)]
    pub filters: FilterConfig,

    /// 临时文件与输出文件位置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 消息网关 (dry-run 时可省略)
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,

    /// 允许发送的操作员
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
}

/// 列绑定：数据相关列的表头名称
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBindings {
    /// 街区列
    pub neighborhood: String,

    /// 状态列
    pub status: String,

    /// 日期列
    pub date: String,

    /// 电话列
    pub phone: String,

    /// 姓名列 (可选，用于报告)
    #[serde(default)]
    pub name: Option<String>,

    /// 标识列 (可选，缺省时使用行号)
    #[serde(default)]
    pub identifier: Option<String>,
}

/// 大小上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// CSV 上限 (字节)，流式读取
    #[serde(default = "default_delimited_max_bytes")]
    pub delimited_max_bytes: u64,

    /// 表格文件上限 (字节)，整体载入内存
    #[serde(default = "default_spreadsheet_max_bytes")]
    pub spreadsheet_max_bytes: u64,

    /// 预览行数
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            delimited_max_bytes: default_delimited_max_bytes(),
            spreadsheet_max_bytes: default_spreadsheet_max_bytes(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_delimited_max_bytes() -> u64 {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_spreadsheet_max_bytes() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

fn default_preview_rows() -> usize {
    20
}

/// 过滤策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 日期无法解析时的处理方式
    #[serde(default)]
    pub unparseable_dates: UnparseableDatePolicy,
}

/// 存储位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 上传文件的临时目录
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 过滤结果文件名
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,

    /// 消息正文文件名
    #[serde(default = "default_message_name")]
    pub message_name: String,

    /// 最近一次发送报告文件名
    #[serde(default = "default_report_name")]
    pub report_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
            artifact_name: default_artifact_name(),
            message_name: default_message_name(),
            report_name: default_report_name(),
        }
    }
}

impl StorageConfig {
    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(&self.artifact_name)
    }

    pub fn message_path(&self) -> PathBuf {
        self.output_dir.join(&self.message_name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_name)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("data/tmp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_artifact_name() -> String {
    "filtered.xlsx".to_string()
}

fn default_message_name() -> String {
    "message.txt".to_string()
}

fn default_report_name() -> String {
    "last-send-report.json".to_string()
}

/// 消息网关配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// 发送地址 (POST)
    pub send_url: String,

    /// 作为 `cid` 查询参数传递的客户端 ID
    pub client_id: String,

    /// 单次请求超时 (毫秒)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// 令牌来源
    #[serde(default)]
    pub auth: AuthConfig,
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

/// 令牌来源；密钥只以环境变量名出现在配置中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthConfig {
    /// 从环境变量读取固定令牌
    Static {
        #[serde(default = "default_token_env")]
        token_env: String,
    },
    /// 通过 clientId/clientSecret 换取令牌
    ClientCredentials {
        token_url: String,
        #[serde(default = "default_client_id_env")]
        client_id_env: String,
        #[serde(default = "default_client_secret_env")]
        client_secret_env: String,
    },
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::Static {
            token_env: default_token_env(),
        }
    }
}

fn default_token_env() -> String {
    "ROWCAST_API_TOKEN".to_string()
}

fn default_client_id_env() -> String {
    "ROWCAST_CLIENT_ID".to_string()
}

fn default_client_secret_env() -> String {
    "ROWCAST_CLIENT_SECRET".to_string()
}

/// 操作员账户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub username: String,

    /// 密码的 SHA-256 十六进制摘要
    pub password_sha256: String,
}
