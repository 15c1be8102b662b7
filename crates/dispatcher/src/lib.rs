//! # Dispatcher
//!
//! 消息分发模块。
//!
//! 负责：
//! - 按行顺序逐条发送消息 (`DispatchCoordinator`)
//! - 汇总成功 / 失败并归类失败原因
//! - 消息网关 HTTP 传输与令牌获取
//!
//! 单条发送失败不会中断整轮发送。

pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod token;
pub mod transports;

pub use contracts::{DispatchReport, MessageTransport, SendAttempt, TokenProvider};
pub use coordinator::{DispatchCoordinator, DispatchOptions};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, TransportMetrics};
pub use token::{ClientCredentialsProvider, ConfiguredTokenProvider, StaticTokenProvider};
pub use transports::{build_client, HttpTransport, LogTransport, ScriptedTransport};
