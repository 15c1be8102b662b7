//! # Filter Engine
//!
//! 多维度行过滤引擎。
//!
//! 负责：
//! - 提取列的去重排序取值 (`RowIndexer`)
//! - 街区 / 状态集合与日期区间的组合过滤 (`FilterEngine`)
//! - 日期单元格解析 (日/月/年优先)
//!
//! ## 使用示例
//!
//! ```ignore
//! use filter_engine::{FilterEngine, RowIndexer};
//! use contracts::FilterCriteria;
//!
//! let neighborhoods = RowIndexer::extract_unique_values(&dataset, "Bairro")?;
//!
//! let criteria = FilterCriteria::all().with_neighborhoods(["Centro"]);
//! let filtered = FilterEngine::default().filter(&dataset, &bindings, &criteria)?;
//! ```

mod dates;
mod engine;
mod indexer;

// Re-exports
pub use contracts::{FilterCriteria, FilterOptions, UnparseableDatePolicy};
pub use dates::{parse_date_text, resolve_cell_date};
pub use engine::{FilterEngine, RowPredicate};
pub use indexer::RowIndexer;
