//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::{DatasetId, SourceKind};
use std::path::PathBuf;

/// Rowcast - filter a tabular contact list and broadcast a message to each row
#[derive(Parser, Debug)]
#[command(
    name = "rowcast",
    author,
    version,
    about = "Filter tabular contact lists and broadcast a message to each row",
    long_about = "Ingests a CSV or spreadsheet file, filters its rows by neighborhood, \n\
                  status and date, writes the selection as a workbook and sends one \n\
                  message per selected row through the configured gateway."
)]
pub struct Cli {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        global = true,
        default_value = "rowcast.toml",
        env = "ROWCAST_CONFIG"
    )]
    pub config: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ROWCAST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ROWCAST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "ROWCAST_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a CSV or spreadsheet file and print its summary
    Ingest(IngestArgs),

    /// List the distinct values of a column
    Values(ValuesArgs),

    /// Preview the rows matching a filter
    Filter(FilterArgs),

    /// Write the matching rows to the output workbook
    Export(ExportArgs),

    /// Send a message to every matching row
    Send(SendArgs),

    /// Show the report of the last send
    Report(ReportArgs),

    /// Delete a stored dataset
    Remove(RemoveArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `ingest` command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// File to ingest
    #[arg(short, long)]
    pub file: PathBuf,

    /// Content kind (inferred from the extension when omitted)
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `values` command
#[derive(Args, Debug)]
pub struct ValuesArgs {
    /// Dataset id returned by `ingest`
    #[arg(short, long)]
    pub dataset: DatasetId,

    /// Header of the column to scan
    #[arg(long)]
    pub column: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Row selection shared by `filter`, `export` and `send`
#[derive(Args, Debug, Clone, Default)]
pub struct CriteriaArgs {
    /// JSON filter request file (`neighborhoods`, `statuses`, `dateRange`)
    #[arg(long, conflicts_with_all = ["neighborhoods", "statuses", "from", "to"])]
    pub filters: Option<PathBuf>,

    /// Keep rows in this neighborhood (repeatable)
    #[arg(long = "neighborhood")]
    pub neighborhoods: Vec<String>,

    /// Keep rows with this status (repeatable)
    #[arg(long = "status")]
    pub statuses: Vec<String>,

    /// First day to keep (YYYY-MM-DD); alone it selects a single day
    #[arg(long)]
    pub from: Option<String>,

    /// Last day to keep (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for the `filter` command
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Dataset id returned by `ingest`
    #[arg(short, long)]
    pub dataset: DatasetId,

    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Number of matching rows to print
    #[arg(long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `export` command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Dataset id returned by `ingest`
    #[arg(short, long)]
    pub dataset: DatasetId,

    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Also store this message beside the workbook
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Arguments for the `send` command
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Dataset id returned by `ingest`
    #[arg(short, long)]
    pub dataset: DatasetId,

    #[command(flatten)]
    pub criteria: CriteriaArgs,

    /// Message sent to every matching row
    #[arg(short, long, env = "ROWCAST_MESSAGE")]
    pub message: String,

    /// Operator running the send
    #[arg(long, env = "ROWCAST_OPERATOR")]
    pub operator: Option<String>,

    /// Operator password
    #[arg(long, env = "ROWCAST_PASSWORD", hide_env_values = true, hide = true)]
    pub password: Option<String>,

    /// Log messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Stop after this many sends (0 = unlimited)
    #[arg(long, default_value = "0", env = "ROWCAST_MAX_SENDS")]
    pub max_sends: usize,

    /// Stop the run after an Unauthorized or Forbidden response
    #[arg(long)]
    pub stop_on_fatal: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `report` command
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `remove` command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Dataset id returned by `ingest`
    #[arg(short, long)]
    pub dataset: DatasetId,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Declared content kind
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    /// Delimited text (CSV)
    Csv,
    /// Workbook (xlsx, xls, ods)
    Spreadsheet,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Csv => SourceKind::DelimitedText,
            KindArg::Spreadsheet => SourceKind::Spreadsheet,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let id = DatasetId::generate();
        let cli = Cli::try_parse_from([
            "rowcast",
            "send",
            "--dataset",
            &id.to_string(),
            "--neighborhood",
            "Centro",
            "--neighborhood",
            "Norte",
            "--from",
            "2024-01-01",
            "--message",
            "Olá",
            "--max-sends",
            "5",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.dataset, id);
                assert_eq!(args.criteria.neighborhoods, vec!["Centro", "Norte"]);
                assert_eq!(args.criteria.from.as_deref(), Some("2024-01-01"));
                assert_eq!(args.max_sends, 5);
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_filters_file_conflicts_with_flags() {
        let id = DatasetId::generate().to_string();
        let result = Cli::try_parse_from([
            "rowcast", "filter", "--dataset", &id, "--filters", "f.json", "--status", "open",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_dataset_id() {
        let result = Cli::try_parse_from(["rowcast", "remove", "--dataset", "not-a-uuid"]);
        assert!(result.is_err());
    }
}
