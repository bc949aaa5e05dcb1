//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use nbsteps_core::pipeline::{ExportResult, ProgressReporter};
use nbsteps_notebook::JupyterExecutor;
use nbsteps_shared::{AppConfig, ExportConfig, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbsteps: turn a notebook into a navigable steps document.
///
/// `nbsteps <notebook> --version V` exports directly; `export` and `config`
/// are also available as subcommands.
#[derive(Parser)]
#[command(
    name = "nbsteps",
    about = "Execute a notebook and export ordered steps, figures, and metrics for a static site.",
    long_about = None,
    // `--version` is the model version of the export, not the tool's.
    disable_version_flag = true,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub export: ExportArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Arguments of an export run.
#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Path to the notebook (.ipynb).
    #[arg(required = true)]
    pub notebook: Option<PathBuf>,

    /// Model version; names every output path.
    #[arg(long, default_value = "1.0")]
    pub version: String,

    /// Site public directory (defaults to config, then `public`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Export stored outputs without executing the notebook.
    #[arg(long)]
    pub no_execute: bool,

    /// Execution timeout in seconds (defaults to config, then 1200).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Kernel name (defaults to config, then `python3`).
    #[arg(long)]
    pub kernel: Option<String>,
}

/// CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Execute a notebook and export its steps, images, and metrics.
    Export(ExportArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbsteps=info",
        1 => "nbsteps=debug",
        _ => "nbsteps=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Export(args)) => cmd_export(args).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
        None => cmd_export(cli.export).await,
    }
}

/// Merge file config and CLI flags (flags win).
fn resolve_export_config(config: &AppConfig, notebook: PathBuf, args: ExportArgs) -> ExportConfig {
    let mut export = ExportConfig::from_app(config, notebook, args.version);
    if let Some(out) = args.out {
        export.public_dir = out;
    }
    if let Some(secs) = args.timeout {
        export.timeout = Duration::from_secs(secs);
    }
    if let Some(kernel) = args.kernel {
        export.kernel = kernel;
    }
    export.execute = !args.no_execute;
    export
}

async fn cmd_export(mut args: ExportArgs) -> Result<()> {
    let notebook = args
        .notebook
        .take()
        .ok_or_else(|| eyre!("missing notebook path"))?;

    // Fail before touching the filesystem.
    if !notebook.exists() {
        return Err(eyre!("notebook not found: {}", notebook.display()));
    }

    let config = load_config()?;
    let export = resolve_export_config(&config, notebook, args);
    export.validate()?;

    info!(
        notebook = %export.notebook.display(),
        version = %export.version,
        execute = export.execute,
        "exporting notebook"
    );

    let executor = JupyterExecutor::new(&export.command, &export.kernel);
    let reporter = CliProgress::new();
    let result = nbsteps_core::export_notebook(&export, &executor, &reporter).await?;

    let metrics = if result.metrics_found.is_empty() {
        "none".to_string()
    } else {
        result.metrics_found.join(", ")
    };

    println!();
    println!("  Notebook exported!");
    println!("  Version:  {}", export.version);
    println!("  Steps:    {}", result.step_count);
    println!("  Images:   {}", result.image_count);
    println!("  Metrics:  {metrics}");
    println!("  Manifest: {}", result.documents.manifest_path.display());
    println!("  Steps:    {}", result.documents.steps_path.display());
    if let Some(executed) = &result.executed_path {
        println!("  Executed: {}", executed.display());
    }
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn cell_processed(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Building steps [{current}/{total}]"));
    }

    fn done(&self, _result: &ExportResult) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
