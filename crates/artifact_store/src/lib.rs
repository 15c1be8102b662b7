//! # Artifact Store
//!
//! 数据集临时文件与输出产物的持久化。
//!
//! 负责：
//! - 以 `DatasetId` 为键保存上传文件 (`ArtifactStore`)
//! - 将过滤结果写为单表工作簿，保留单元格类型 (`OutputSerializer`)
//! - 保存 / 读取最近一次发送报告 (`ReportStore`)
//!
//! 所有输出文件均通过临时文件 + 重命名原子替换。

mod atomic;
mod error;
mod preview;
mod report;
mod serializer;
mod store;

// Re-exports
pub use atomic::atomic_write;
pub use error::{Result, StoreError};
pub use preview::format_for_preview;
pub use report::ReportStore;
pub use serializer::{workbook_bytes, OutputSerializer, ARTIFACT_DATE_FORMAT};
pub use store::ArtifactStore;
