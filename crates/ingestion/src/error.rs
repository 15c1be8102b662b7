//! Ingestion 错误类型

use contracts::{ContractError, SourceKind};
use thiserror::Error;

use crate::limits::format_bytes;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 超过文件大小上限
    #[error("{}", size_message(*kind, *limit))]
    SizeLimitExceeded {
        /// 文件类型
        kind: SourceKind,
        /// 上限 (字节)
        limit: u64,
    },

    /// CSV 读取失败
    #[error("failed to read delimited text: {0}")]
    Delimited(#[from] csv::Error),

    /// 表格文件读取失败
    #[error("failed to read spreadsheet: {message}")]
    Spreadsheet {
        /// 错误消息
        message: String,
    },

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestionError {
    pub(crate) fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            message: message.into(),
        }
    }
}

fn size_message(kind: SourceKind, limit: u64) -> String {
    match kind {
        SourceKind::DelimitedText => {
            format!("file too large: CSV files are limited to {}", format_bytes(limit))
        }
        SourceKind::Spreadsheet => format!(
            "file too large: Excel files are limited to {}, convert larger data to CSV",
            format_bytes(limit)
        ),
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            // 文件缺失等 IO 问题不是输入内容本身的问题
            IngestionError::Io(e) => ContractError::Io(e),
            other => ContractError::parse(other.to_string()),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T, E = IngestionError> = std::result::Result<T, E>;
