mod config;
mod error;
mod report;
mod routes;

use clap::{CommandFactory, Parser};
use std::io::{Stderr, Stdout};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use config::{CliArgs, Config, Mode};
use error::{AppError, AppResult};
use report::{ReportFormat, Reporter};
use routes::{archive, parser};

type StdReporter = Reporter<Stdout, Stderr>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let mut reporter = Reporter::stdio(ReportFormat::Text);

    let cli_args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let detail = e.to_string();
            let detail = detail.lines().next().unwrap_or("invalid arguments");
            let err = AppError::Usage(detail.trim_start_matches("error: ").to_string());
            reporter.failure(&err);
            return ExitCode::from(err.exit_code());
        }
    };

    let config = match Config::load(cli_args) {
        Ok(config) => config,
        Err(e) => {
            reporter.failure(&e);
            return ExitCode::from(e.exit_code());
        }
    };
    reporter.set_format(config.report_format);

    init_logging(&config);
    if let Some(source) = &config.config_source {
        tracing::info!("Loaded configuration from: {}", source.display());
    }

    match run(&config, &mut reporter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Terminating: {:?}", e);
            reporter.failure(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(config: &Config, reporter: &mut StdReporter) -> AppResult<()> {
    match config.mode {
        Some(Mode::Export) => export_route_table(config, reporter).await,
        Some(Mode::Import) => import_route_table(config, reporter),
        None => {
            let help = CliArgs::command().render_help().to_string();
            reporter.usage(&help)
        }
    }
}

async fn export_route_table(config: &Config, reporter: &mut StdReporter) -> AppResult<()> {
    let snapshot = parser::capture(&config.capture).await?;
    if snapshot.is_empty() {
        tracing::warn!("`{}` reported no routes", config.capture.command_line());
    }
    archive::write_archive(&snapshot, &config.archive_path)?;

    tracing::info!(
        "Exported {} routes to {}",
        snapshot.len(),
        config.archive_path.display()
    );
    reporter.exported(&config.archive_path, &snapshot)
}

// Reads and reports only; routes are never installed into the live table.
fn import_route_table(config: &Config, reporter: &mut StdReporter) -> AppResult<()> {
    let snapshot = archive::read_archive(&config.archive_path)?;

    tracing::info!(
        "Read {} routes from {}",
        snapshot.len(),
        config.archive_path.display()
    );
    reporter.imported(&config.archive_path, &snapshot)
}
