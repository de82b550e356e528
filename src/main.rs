//! ADR Dashboard CLI - browse ADRs, their enforced rules and live violations
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to loader and dashboard operations
//! - Handles external concerns like terminal output, stdin selection and exit codes
//! - Provides clean separation between user interface and business logic

use adr_dashboard::{
    connect, filter_violations, load_adr, load_manifest, poll_violations, start_dashboard,
    upload_sarif, ConfigBuilder, DashboardConfig, DashboardData, OutputFormat, ReportFormatter,
    ReportOptions, Selection,
};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};

/// ADR Dashboard - Architecture Decision Records and their live enforcement
#[derive(Parser)]
#[command(name = "adr-dashboard")]
#[command(version = "0.1.0")]
#[command(about = "Browse Architecture Decision Records, their enforcement manifest and live rule violations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the repository key
    #[arg(long, global = true)]
    repo: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List enforced rules with their live violation counts
    Manifest {
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Show one ADR and the violations reported against it
    Show {
        /// ADR identifier, e.g. ADR-CS-001
        adr_id: String,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Maximum number of violations to list
        #[arg(long)]
        max_violations: Option<usize>,
    },

    /// List current violations
    Violations {
        /// Only violations of this ADR
        #[arg(long)]
        adr: Option<String>,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Live view refreshed by the polling timers; type an ADR id on stdin to select it
    Watch {
        /// Initial selection
        #[arg(long)]
        adr: Option<String>,

        /// Exit after this many renders
        #[arg(long)]
        ticks: Option<usize>,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Aggregate compliance and trend figures
    Insights {
        /// YAML or JSON dataset to use instead of the built-in one
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Map a SARIF report onto ADRs and upload the violations
    Upload {
        /// Path to the SARIF report
        #[arg(long)]
        sarif: PathBuf,

        /// Print the mapped violations instead of uploading them
        #[arg(long)]
        dry_run: bool,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<i32> {
    let use_colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
    let config_path = cli.config;
    let (base_url, repo) = (cli.base_url, cli.repo);
    let config = || load_config(config_path.as_deref(), base_url.clone(), repo.clone());

    match cli.command {
        Commands::Manifest { format } => run_manifest(&config()?, format, use_colors).await,
        Commands::Show {
            adr_id,
            format,
            max_violations,
        } => run_show(&config()?, &adr_id, format, max_violations, use_colors).await,
        Commands::Violations { adr, format } => {
            run_violations(&config()?, adr, format, use_colors).await
        }
        Commands::Watch { adr, ticks, format } => {
            run_watch(&config()?, adr, ticks, format, use_colors).await
        }
        Commands::Insights { data, format } => run_insights(data.as_deref(), format, use_colors),
        Commands::Upload {
            sarif,
            dry_run,
            format,
        } => run_upload(&config()?, &sarif, dry_run, format, use_colors).await,
        Commands::ValidateConfig { config_file } => {
            Ok(run_validate_config(config_file.as_deref().or(config_path.as_deref())))
        }
    }
}

fn load_config(
    path: Option<&Path>,
    base_url: Option<String>,
    repo: Option<String>,
) -> anyhow::Result<DashboardConfig> {
    let config = match path {
        Some(path) => DashboardConfig::load_from_file(path)?,
        None => DashboardConfig::discover(".")?,
    };

    let mut builder = ConfigBuilder::from_config(config);
    if let Some(base_url) = base_url {
        builder = builder.base_url(base_url);
    }
    if let Some(repo) = repo {
        builder = builder.repo_key(repo);
    }
    Ok(builder.build()?)
}

fn formatter(use_colors: bool, max_violations: Option<usize>) -> ReportFormatter {
    ReportFormatter::new(ReportOptions {
        use_colors,
        max_violations,
        ..Default::default()
    })
}

async fn run_manifest(config: &DashboardConfig, format: OutputFormatArg, use_colors: bool) -> anyhow::Result<i32> {
    let api = connect(config)?;
    let manifest = load_manifest(api.as_ref(), &config.api.repo_key).await;
    let violations = poll_violations(api.as_ref(), &config.api.repo_key)
        .await
        .unwrap_or_default();

    let output = formatter(use_colors, None).format_manifest(&manifest, &violations, format.into())?;
    print!("{output}");
    Ok(0)
}

async fn run_show(
    config: &DashboardConfig,
    adr_id: &str,
    format: OutputFormatArg,
    max_violations: Option<usize>,
    use_colors: bool,
) -> anyhow::Result<i32> {
    let adr_id = match Selection::from_id(Some(adr_id), &config.dashboard_sentinel) {
        Selection::Selected(id) => id,
        Selection::DashboardSelected => return run_insights(None, format, use_colors),
        Selection::Unselected => {
            eprintln!("An ADR id is required");
            return Ok(2);
        }
    };

    let api = connect(config)?;
    let document = match load_adr(api.as_ref(), &adr_id).await {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Failed to load ADR content: {}", e);
            eprintln!("Failed to load ADR details.");
            return Ok(1);
        }
    };
    let violations = poll_violations(api.as_ref(), &config.api.repo_key)
        .await
        .unwrap_or_default();
    let related = filter_violations(&violations, Some(adr_id.as_str()));

    let output = formatter(use_colors, max_violations).format_adr(&document, &related, format.into())?;
    print!("{output}");
    Ok(0)
}

async fn run_violations(
    config: &DashboardConfig,
    adr: Option<String>,
    format: OutputFormatArg,
    use_colors: bool,
) -> anyhow::Result<i32> {
    let api = connect(config)?;
    let violations = match poll_violations(api.as_ref(), &config.api.repo_key).await {
        Ok(violations) => violations,
        Err(e) => {
            eprintln!("Violation feed unavailable: {e}");
            return Ok(1);
        }
    };

    let violations = match adr.as_deref() {
        Some(adr_id) => filter_violations(&violations, Some(adr_id)).into_iter().cloned().collect(),
        None => violations,
    };

    let output = formatter(use_colors, None).format_violations(&violations, format.into())?;
    print!("{output}");
    Ok(0)
}

async fn run_watch(
    config: &DashboardConfig,
    adr: Option<String>,
    ticks: Option<usize>,
    format: OutputFormatArg,
    use_colors: bool,
) -> anyhow::Result<i32> {
    let api = connect(config)?;
    let dashboard = start_dashboard(api, config);
    let insights = DashboardData::builtin();
    let report_formatter = formatter(use_colors, None);
    let format: OutputFormat = format.into();

    if adr.is_some() {
        dashboard.select(Selection::from_id(adr.as_deref(), &config.dashboard_sentinel));
    }

    eprintln!(
        "Watching '{}' at {}. Type an ADR id and press Enter to select it, an empty line to clear, or {} for the overview. Ctrl+C to stop.",
        config.api.repo_key, config.api.base_url, config.dashboard_sentinel
    );

    let mut rx = dashboard.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut renders = 0usize;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let initial = rx.borrow_and_update().clone();
    render_page(&report_formatter, &initial, &insights, format)?;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                render_page(&report_formatter, &state, &insights, format)?;
                renders += 1;
                if ticks.is_some_and(|limit| renders >= limit) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    dashboard.select(Selection::from_id(Some(line.as_str()), &config.dashboard_sentinel))
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!("Stopped reading selections from stdin: {}", e);
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => break,
        }
    }

    dashboard.shutdown().await;
    Ok(0)
}

fn render_page(
    report_formatter: &ReportFormatter,
    state: &adr_dashboard::DashboardState,
    insights: &DashboardData,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let page = report_formatter.format_dashboard(state, insights, format)?;
    if format == OutputFormat::Human {
        clear_screen().context("Failed to clear terminal")?;
    }
    let mut stdout = io::stdout();
    writeln!(stdout, "{page}").context("Failed to write to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(feature = "crossterm")]
fn clear_screen() -> io::Result<()> {
    use crossterm::{
        cursor::MoveTo,
        execute,
        terminal::{Clear, ClearType},
    };

    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
}

#[cfg(not(feature = "crossterm"))]
fn clear_screen() -> io::Result<()> {
    print!("\x1B[2J\x1B[H");
    io::stdout().flush()
}

fn run_insights(data: Option<&Path>, format: OutputFormatArg, use_colors: bool) -> anyhow::Result<i32> {
    let data = match data {
        Some(path) => DashboardData::load_from_file(path)?,
        None => DashboardData::builtin(),
    };

    let output = formatter(use_colors, None).format_insights(&data, format.into())?;
    print!("{output}");
    Ok(0)
}

async fn run_upload(
    config: &DashboardConfig,
    sarif: &Path,
    dry_run: bool,
    format: OutputFormatArg,
    use_colors: bool,
) -> anyhow::Result<i32> {
    let api = connect(config)?;
    let outcome = upload_sarif(api.as_ref(), &config.api.repo_key, sarif, dry_run)
        .await
        .with_context(|| format!("Upload of '{}' failed", sarif.display()))?;

    if outcome.violations.is_empty() {
        println!("No violations found");
        return Ok(0);
    }

    if dry_run {
        let output = formatter(use_colors, None).format_violations(&outcome.violations, format.into())?;
        print!("{output}");
    } else {
        println!(
            "Uploaded {} violations ({} findings in report)",
            outcome.violations.len(),
            outcome.findings
        );
    }
    Ok(0)
}

fn run_validate_config(config_file: Option<&Path>) -> i32 {
    let result = match config_file {
        Some(path) => DashboardConfig::load_from_file(path),
        None => DashboardConfig::discover("."),
    };

    match result {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("   API: {} (repo '{}')", config.api.base_url, config.api.repo_key);
            println!(
                "   Polling: manifest every {}s, violations every {}s",
                config.polling.manifest_interval_secs, config.polling.violation_interval_secs
            );
            0
        }
        Err(e) => {
            eprintln!("❌ {e}");
            1
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
