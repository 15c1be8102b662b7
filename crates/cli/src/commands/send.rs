//! `send` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfiguredOperators;
use contracts::{CredentialVerifier, Dataset, DispatchReport, MessageTransport};
use dispatcher::{
    build_client, ConfiguredTokenProvider, DispatchCoordinator, DispatchOptions, HttpTransport,
    LogTransport,
};
use tracing::{info, warn};

use super::report::print_report;
use super::{criteria_from, print_json};
use crate::cli::SendArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineStats};

/// Execute the `send` command
pub async fn run_send(pipeline: &Pipeline, args: &SendArgs) -> Result<()> {
    verify_operator(pipeline, args)?;

    let criteria = criteria_from(&args.criteria)?;
    let selection = pipeline.select(args.dataset, &criteria).await?;
    let artifact = pipeline.export(&selection.dataset, Some(args.message.as_str()))?;

    let mut stats = PipelineStats {
        total_rows: selection.total_rows,
        matched_rows: selection.dataset.total_rows(),
        artifact: Some(artifact),
        ..PipelineStats::default()
    };

    let blueprint = pipeline.blueprint();
    let mut options = match &blueprint.gateway {
        Some(gateway) => DispatchOptions::from_gateway(gateway),
        None => DispatchOptions::default(),
    };
    if args.max_sends > 0 {
        options = options.with_max_sends(args.max_sends);
    }
    options = options.with_stop_on_fatal(args.stop_on_fatal);

    info!(
        dataset_id = %args.dataset,
        rows = stats.matched_rows,
        dry_run = args.dry_run,
        "Starting send"
    );

    let report = if args.dry_run {
        let transport = LogTransport::new("dry_run");
        dispatch(pipeline, transport, options, &selection.dataset, args, &mut stats).await?
    } else {
        let gateway = blueprint
            .gateway
            .as_ref()
            .ok_or(CliError::GatewayNotConfigured)?;
        let client = build_client(gateway).context("Failed to build HTTP client")?;
        let tokens = ConfiguredTokenProvider::from_config(&gateway.auth, &client)?;
        let transport = HttpTransport::new(client, gateway, tokens);
        dispatch(pipeline, transport, options, &selection.dataset, args, &mut stats).await?
    };

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
        stats.print_summary();
    }

    if report.outcome.is_success() {
        Ok(())
    } else {
        warn!(outcome = ?report.outcome, "Send finished with failures");
        Err(CliError::dispatch_failed(report.outcome.user_message()).into())
    }
}

async fn dispatch<T: MessageTransport>(
    pipeline: &Pipeline,
    transport: T,
    options: DispatchOptions,
    selection: &Dataset,
    args: &SendArgs,
    stats: &mut PipelineStats,
) -> Result<DispatchReport> {
    let mut coordinator = DispatchCoordinator::new(transport, options);
    pipeline
        .send(&mut coordinator, selection, &args.message, stats)
        .await
}

fn verify_operator(pipeline: &Pipeline, args: &SendArgs) -> Result<()> {
    let (Some(username), Some(password)) = (args.operator.as_deref(), args.password.as_deref())
    else {
        return Err(CliError::OperatorRequired.into());
    };

    let operators = ConfiguredOperators::from_blueprint(pipeline.blueprint());
    if !operators.verify(username, password) {
        return Err(CliError::invalid_credentials(username).into());
    }
    info!(operator = username, "Operator verified");
    Ok(())
}
