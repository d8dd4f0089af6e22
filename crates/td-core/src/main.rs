#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;
use td_common::{Error, OutputFormat};
use td_config::{resolve_settings, Settings, SettingsOverrides};
use td_core::dashboard::{assemble, Selections};
use td_core::filter::month_options;
use td_core::logging::init_logging;
use td_core::pretty::{render_dashboard, render_months_list};
use td_core::server::{serve, DashboardService};
use td_core::{ExitCode, LoadCache, LoadedDataset};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ticketdash")]
#[command(version, about = "Helpdesk ticket SLA dashboard")]
#[command(
    after_help = "Environment:\n  TICKETDASH_DATA     Default export path\n  TICKETDASH_BIND     HTTP bind address\n  TICKETDASH_CONFIG   Settings file\n  TICKETDASH_LOG      Log filter (default: info)"
)]
struct Cli {
    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Settings file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an export and print the dashboard.
    Summary(SummaryArgs),
    /// List the months available under a state selection.
    Months(MonthsArgs),
    /// Run the HTTP service.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Args)]
struct SummaryArgs {
    /// Export to load instead of the configured default.
    #[arg(long)]
    file: Option<PathBuf>,
    /// State tag (PE, RN, Outros or all); repeatable.
    #[arg(long)]
    state: Vec<String>,
    /// Month bucket (YYYY-MM); repeatable.
    #[arg(long)]
    month: Vec<String>,
    /// Detail status selection; `--status ""` selects nothing.
    #[arg(long)]
    status: Option<Vec<String>>,
    #[arg(long)]
    priority: Option<Vec<String>>,
    #[arg(long)]
    department: Option<Vec<String>>,
    /// Cap on detail rows printed.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct MonthsArgs {
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    state: Vec<String>,
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();

    let overrides = SettingsOverrides {
        config_path: cli.config.clone(),
        data_path: match &cli.command {
            Commands::Summary(args) => args.file.clone(),
            Commands::Months(args) => args.file.clone(),
            Commands::Serve { .. } => None,
        },
        bind_addr: match &cli.command {
            Commands::Serve { bind } => bind.clone(),
            _ => None,
        },
        log_json: cli.log_json.then_some(true),
    };

    let settings = match resolve_settings(&overrides) {
        Ok(resolved) => {
            init_logging(resolved.settings.log_json);
            if resolved.using_defaults {
                info!("no settings file, using defaults");
            }
            resolved.settings
        }
        Err(e) => {
            init_logging(cli.log_json);
            return report_error(cli.format, &Error::from(e)).into();
        }
    };

    match run(&cli, &settings) {
        Ok(()) => ExitCode::Clean.into(),
        Err(e) => report_error(cli.format, &e).into(),
    }
}

fn run(cli: &Cli, settings: &Settings) -> td_common::Result<()> {
    match &cli.command {
        Commands::Summary(args) => {
            let selections = Selections {
                states: args.state.clone(),
                months: args.month.clone(),
                statuses: non_empty(&args.status),
                priorities: non_empty(&args.priority),
                departments: non_empty(&args.department),
            };
            let request = selections
                .into_request(args.limit.or(settings.detail_row_limit))
                .map_err(|e| Error::Config(e.to_string()))?;
            let dataset = load_dataset(&settings.data_path)?;
            let dashboard = assemble(&dataset, &request);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
                OutputFormat::Pretty => println!("{}", render_dashboard(&dashboard)),
            }
        }
        Commands::Months(args) => {
            let selections = Selections {
                states: args.state.clone(),
                ..Default::default()
            };
            let view = selections
                .view_filter()
                .map_err(|e| Error::Config(e.to_string()))?;
            let dataset = load_dataset(&settings.data_path)?;
            let months = month_options(&dataset.table, &view);
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "months": months }))?)
                }
                OutputFormat::Pretty => println!("{}", render_months_list(&months)),
            }
        }
        Commands::Serve { .. } => {
            let service =
                DashboardService::new(settings.data_path.clone(), settings.detail_row_limit);
            serve(&settings.bind_addr, service)?;
        }
    }
    Ok(())
}

/// Detail selections with blank entries removed.
fn non_empty(values: &Option<Vec<String>>) -> Option<Vec<String>> {
    values
        .as_ref()
        .map(|v| v.iter().filter(|s| !s.trim().is_empty()).cloned().collect())
}

fn load_dataset(path: &Path) -> td_common::Result<Arc<LoadedDataset>> {
    LoadCache::new().get_or_load_path(path).map_err(|e| {
        eprintln!("{}", e.diagnostic());
        Error::from(e)
    })
}

fn report_error(format: OutputFormat, err: &Error) -> ExitCode {
    let code = ExitCode::for_error(err);
    error!(code = err.code(), error = %err, "command failed");
    match format {
        OutputFormat::Json => eprintln!(
            "{}",
            json!({ "error": err.to_string(), "code": err.code(), "exit_code": code.as_i32() })
        ),
        OutputFormat::Pretty => eprintln!("error: {err}"),
    }
    code
}
