//! MessageTransport implementations

mod http;
mod log;
mod scripted;

pub use http::{build_client, HttpTransport};
pub use log::LogTransport;
pub use scripted::ScriptedTransport;
