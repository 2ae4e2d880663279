//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use channelkeys_core::{
    BatchProgress, BatchSummary, LoadSource, ResolveError, decode_page, run_scrape,
};
use channelkeys_fetch::HttpFetcher;
use channelkeys_shared::{
    AppConfig, DETAIL_PREFIX_ENV, Identifier, LISTING_URL_ENV, RunConfig, RunOverrides,
    StreamDescriptor, config_file_path, init_config, load_config, load_config_from,
};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// channelkeys: collect stream manifests and clear keys from a channel site.
#[derive(Parser)]
#[command(
    name = "channelkeys",
    version,
    about = "Discover channels, decode their player pages and save manifest URLs with key material.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.channelkeys/channelkeys.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Runs a scrape when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Inputs for a scrape run.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Channel listing page URL.
    #[arg(long, env = LISTING_URL_ENV)]
    pub listing_url: Option<String>,

    /// Detail page URL prefix; the channel id is appended.
    #[arg(long, env = DETAIL_PREFIX_ENV)]
    pub stream_url: Option<String>,

    /// Output JSON file (defaults to the config file value, then api_data.json).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Decode a saved detail page and print its stream descriptor.
    Decode {
        /// Path to the saved HTML page.
        file: PathBuf,
    },

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
        0 => "channelkeys=info",
        1 => "channelkeys=debug",
        _ => "channelkeys=trace",
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
        None => cmd_scrape(cli.config.as_deref(), cli.run).await,
        Some(Command::Decode { file }) => cmd_decode(&file),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
    }
}

fn read_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn cmd_scrape(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let app = read_app_config(config_path)?;
    let config = RunConfig::resolve(
        &app,
        RunOverrides {
            listing_url: args.listing_url,
            detail_prefix: args.stream_url,
            output_path: args.output,
        },
    )?;

    info!(
        listing_url = %config.listing_url,
        output = %config.output_path.display(),
        "starting scrape"
    );

    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let reporter = CliProgress::new();
    let outcome = run_scrape(&config, &fetcher, &reporter).await;
    reporter.spinner.finish_and_clear();
    let outcome = outcome?;

    let summary = &outcome.summary;
    println!();
    println!("  Scrape finished.");
    println!("  Previous:  {}", describe_source(&outcome.store_source));
    println!("  Channels:  {}", summary.total);
    println!("  Resolved:  {}", summary.resolved);
    println!("  Skipped:   {}", summary.skipped.len());
    for skipped in &summary.skipped {
        println!("    {} ({}): {}", skipped.id, skipped.kind, skipped.reason);
    }
    println!("  Stored:    {}", outcome.results.len());
    println!("  Output:    {}", config.output_path.display());
    println!("  Time:      {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    if let Some(e) = &outcome.save_error {
        error!(error = %e, "results were not saved");
        eprintln!("  Warning: results were not saved: {e}");
    }

    Ok(())
}

fn describe_source(source: &LoadSource) -> String {
    match source {
        LoadSource::File { dropped: 0 } => "loaded".into(),
        LoadSource::File { dropped } => format!("loaded, {dropped} malformed entries dropped"),
        LoadSource::Missing => "none".into(),
        LoadSource::Unreadable(reason) => format!("unreadable, started empty ({reason})"),
    }
}

fn cmd_decode(file: &Path) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("cannot read {}", file.display()))?;

    let descriptor = decode_page(&html).map_err(|e| eyre!("{}: {e}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let source = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    let config = read_app_config(path)?;
    println!("# {}", source.display());
    println!("{}", toml::to_string_pretty(&config)?);
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
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl BatchProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn resolving(&self, id: &Identifier, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {id}"));
    }

    fn resolved(&self, _id: &Identifier, _descriptor: &StreamDescriptor) {}

    fn skipped(&self, id: &Identifier, error: &ResolveError) {
        self.spinner
            .println(format!("  skipped {id}: {}", error.kind()));
    }

    fn done(&self, _summary: &BatchSummary) {
        self.spinner.finish_and_clear();
    }
}
