//! # Rowcast CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 文件导入、过滤、导出
//! - 带操作员校验的批量发送与报告查询

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{
    run_export, run_filter, run_ingest, run_remove, run_report, run_send, run_validate,
    run_values,
};
use pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_observability(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Rowcast CLI starting");

    let result = run(&cli).await;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

async fn run(cli: &Cli) -> Result<()> {
    if let Commands::Validate(args) = &cli.command {
        return run_validate(&cli.config, args);
    }

    let pipeline = Pipeline::from_config_path(&cli.config)?;
    match &cli.command {
        Commands::Ingest(args) => run_ingest(&pipeline, args).await,
        Commands::Values(args) => run_values(&pipeline, args).await,
        Commands::Filter(args) => run_filter(&pipeline, args).await,
        Commands::Export(args) => run_export(&pipeline, args).await,
        Commands::Send(args) => run_send(&pipeline, args).await,
        Commands::Report(args) => run_report(&pipeline, args),
        Commands::Remove(args) => run_remove(&pipeline, args),
        Commands::Validate(args) => run_validate(&cli.config, args),
    }
}

/// Initialize tracing and the optional metrics endpoint from CLI options
fn init_observability(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let config = ObservabilityConfig {
        log_format: cli.log_format.into(),
        default_log_level: default_log_level.to_string(),
        ..ObservabilityConfig::default()
    }
    .with_metrics_port(cli.metrics_port);

    observability::init_with_config(config)
}
