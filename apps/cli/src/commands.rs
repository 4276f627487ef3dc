//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use kantanpress_core::builder::build_site;
use kantanpress_core::pipeline::{ProgressReporter, PublishOptions, PublishResult, publish};
use kantanpress_deploy::{DeployOptions, HostingClient, deploy};
use kantanpress_shared::{
    AppConfig, init_config, load_config, load_config_from, resolve_credentials,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// KantanPress — publish CMS content as a static site.
#[derive(Parser)]
#[command(
    name = "kantanpress",
    version,
    about = "Fetch Kantan CMS content, build a static site, and deploy it.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path (defaults to ~/.kantanpress/kantanpress.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the CMS base URL.
    #[arg(long, env = "KANTAN_CMS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Override the snapshot storage directory.
    #[arg(long, env = "KANTAN_STORAGE_PATH", global = true)]
    pub storage_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
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
    /// Fetch collection records from the CMS into local snapshots.
    Fetch,

    /// Convert fetched snapshots into generator-ready content files.
    Convert,

    /// Run the static site generator.
    Build,

    /// Package the generated site and upload it to hosting.
    Deploy {
        /// Deploy as a preview instead of production hosting.
        #[arg(long)]
        preview: bool,
    },

    /// Run the full pipeline: fetch, convert, build, deploy.
    Publish {
        /// Deploy as a preview instead of production hosting.
        #[arg(long)]
        preview: bool,
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
        0 => "kantanpress=info",
        1 => "kantanpress=debug",
        _ => "kantanpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Fetch => cmd_fetch(&config).await,
        Command::Convert => cmd_convert(&config).await,
        Command::Build => cmd_build(&config).await,
        Command::Deploy { preview } => cmd_deploy(&config, preview).await,
        Command::Publish { preview } => cmd_publish(config, preview).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

/// Load config (from --config or the default location) and apply CLI overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(base_url) = &cli.base_url {
        config.cms.base_url = base_url.clone();
    }
    if let Some(storage_path) = &cli.storage_path {
        config.fetch.storage_path = storage_path.clone();
    }

    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_fetch(config: &AppConfig) -> Result<()> {
    let credentials = resolve_credentials(config)?;
    let client = kantanpress_cms::CmsClient::new(
        &config.cms.base_url,
        &credentials,
        config.cms.page_size,
    )?;

    info!(base_url = %config.cms.base_url, "fetching CMS content");

    let summary = kantanpress_cms::fetch_all(&client, &config.fetch).await?;

    println!();
    println!("  Fetched {} collection(s)", summary.collections.len());
    for c in &summary.collections {
        println!("  {:<12} {:>4} record(s)  {}", c.name, c.records, c.file.display());
    }
    println!("  Time:   {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_convert(config: &AppConfig) -> Result<()> {
    info!(converters = config.converters.len(), "converting snapshots");

    let mut total_files = 0;
    for converter in &config.converters {
        let summary = kantanpress_convert::run_converter(converter, &config.fetch.storage_path)?;
        println!(
            "  {:<12} {:>4} file(s)  {}",
            summary.collection,
            summary.files,
            summary.target_dir.display()
        );
        total_files += summary.files;
    }

    for export in &config.exports {
        let path = kantanpress_convert::export_latest(export)?;
        println!("  export       {}", path.display());
    }

    println!();
    println!("  Converted {total_files} file(s)");
    println!();

    Ok(())
}

async fn cmd_build(config: &AppConfig) -> Result<()> {
    info!(command = %config.build.command, "building static site");

    let output = build_site(&config.build)?;

    println!();
    println!("  Site built in {:.1}s", output.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_deploy(config: &AppConfig, preview: bool) -> Result<()> {
    let credentials = resolve_credentials(config)?;
    let client = HostingClient::new(&config.cms.base_url, &credentials)?;

    let options = DeployOptions {
        static_output_dir: PathBuf::from(&config.deploy.static_output_dir),
        zip_filename: PathBuf::from(&config.deploy.zip_filename),
        preview,
    };

    info!(preview, "deploying static site");

    let result = deploy(&client, &options).await?;

    println!();
    println!(
        "  {} deployment complete",
        if result.preview { "Preview" } else { "Production" }
    );
    println!("  Files:  {}", result.file_count);
    println!("  Size:   {} bytes", result.zip_size_bytes);
    println!("  SHA256: {}", result.sha256);
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_publish(config: AppConfig, preview: bool) -> Result<()> {
    let credentials = resolve_credentials(&config)?;

    let options = PublishOptions {
        config,
        credentials,
        preview,
    };

    info!(preview, "starting publish pipeline");

    let reporter = CliProgress::new();
    let result = publish(&options, &reporter).await?;

    println!();
    println!("  Site published successfully!");
    println!("  Collections: {}", result.collections);
    println!("  Files:       {}", result.files_converted);
    println!("  Upload:      {} bytes", result.zip_size_bytes);
    println!("  Target:      {}", if result.preview { "preview" } else { "production" });
    println!("  Time:        {:.1}s", result.elapsed.as_secs_f64());
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, current: usize, total: usize, detail: &str) {
        self.spinner.set_message(format!("[{current}/{total}] {detail}"));
    }

    fn done(&self, _result: &PublishResult) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
