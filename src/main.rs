use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use osvstats::{
    config::{Config, DataLayout},
    fetcher::{self, FetchReport, OsvBucket},
    logging::{self, Verbosity},
    model::Ecosystem,
    output::{print_summary, OutputFormat},
    pipeline, summarizer,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

/// Exit codes
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "osvstats")]
#[command(
    author,
    version,
    about = "Download OSV advisories and compute per-ecosystem statistics"
)]
struct Cli {
    /// Root data directory (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and extract advisory archives into raw/
    Fetch {
        /// Only fetch these ecosystems (repeatable)
        #[arg(short, long = "ecosystem")]
        ecosystems: Vec<Ecosystem>,
    },

    /// Flatten raw/ advisories into processed/osv-data.csv
    Flatten,

    /// Summarize processed/osv-data.csv per ecosystem and type
    Summarize,

    /// Run fetch, flatten and summarize in order
    All,

    /// Print the ecosystem summary
    Show {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List supported ecosystems
    Ecosystems,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable config file: {:#}", e);
        Config::default()
    });
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let layout = config.layout();
    let show_table = !cli.quiet;

    match cli.command {
        Commands::Fetch { ecosystems } => {
            let ecosystems = if ecosystems.is_empty() {
                config.ecosystems.clone()
            } else {
                ecosystems
            };
            run_fetch(&config, &layout, &ecosystems).await?;
        }
        Commands::Flatten => run_flatten(&layout)?,
        Commands::Summarize => run_summarize(&config, &layout, show_table)?,
        Commands::All => {
            run_fetch(&config, &layout, &config.ecosystems).await?;
            run_flatten(&layout)?;
            run_summarize(&config, &layout, show_table)?;
        }
        Commands::Show { format } => {
            let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
            let rows = summarizer::load_summary(&layout.summary_csv())?;
            print_summary(&rows, format)?;
        }
        Commands::Ecosystems => list_ecosystems(&config)?,
        Commands::Config { init, path } => handle_config(&config, &layout, init, path)?,
    }

    Ok(exit_codes::SUCCESS)
}

async fn run_fetch(config: &Config, layout: &DataLayout, ecosystems: &[Ecosystem]) -> Result<()> {
    let source = OsvBucket::with_base_url(&config.base_url, &config.user_agent)?;

    let report = if std::io::stderr().is_terminal() {
        fetch_with_progress(&source, layout, ecosystems).await?
    } else {
        pipeline::run_fetch(layout, &source, ecosystems).await?
    };

    for failure in &report.failed {
        warn!("Skipped {}: {}", failure.ecosystem, failure.reason);
    }
    Ok(())
}

/// Same loop as [`pipeline::run_fetch`], with a progress bar per ecosystem.
async fn fetch_with_progress(
    source: &OsvBucket,
    layout: &DataLayout,
    ecosystems: &[Ecosystem],
) -> Result<FetchReport> {
    let raw_dir = layout.raw_dir();
    std::fs::create_dir_all(&raw_dir)?;

    let pb = ProgressBar::new(ecosystems.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut report = FetchReport::default();
    for &ecosystem in ecosystems {
        pb.set_message(format!("Fetching {}...", ecosystem));
        let outcome = fetcher::fetch(source, ecosystem, &raw_dir).await;
        report.record(ecosystem, outcome);
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "Fetched {} of {} ecosystems",
        report.fetched.len(),
        ecosystems.len()
    ));
    Ok(report)
}

fn run_flatten(layout: &DataLayout) -> Result<()> {
    let outcome = pipeline::run_flatten(layout)?;
    if !outcome.skipped.is_empty() {
        warn!("{} advisory files could not be read", outcome.skipped.len());
    }
    info!("Wrote {} rows to {}", outcome.rows, outcome.output.display());
    Ok(())
}

fn run_summarize(config: &Config, layout: &DataLayout, show_table: bool) -> Result<()> {
    let years = config.year_range()?;
    let summary = pipeline::run_summarize(layout, &years)?;
    info!(
        "Summarized {} ecosystem groups over {}-{}",
        summary.len(),
        years.start(),
        years.end()
    );
    if show_table {
        print_summary(&summary, OutputFormat::Table)?;
    }
    Ok(())
}

fn list_ecosystems(config: &Config) -> Result<()> {
    let bucket = OsvBucket::with_base_url(&config.base_url, &config.user_agent)?;

    println!("Supported ecosystems:");
    println!();

    for ecosystem in Ecosystem::ALL {
        let enabled = if config.ecosystems.contains(&ecosystem) {
            "yes"
        } else {
            "no"
        };

        println!(
            "  {:<12} {:<25} [enabled: {}]",
            ecosystem.as_str(),
            ecosystem.language(),
            enabled
        );
        println!("  {:<12} Archive: {}", "", bucket.archive_url(ecosystem));
        println!();
    }

    Ok(())
}

/// Prints the effective configuration, i.e. the config file merged with
/// command-line overrides.
fn handle_config(config: &Config, layout: &DataLayout, init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
        } else {
            Config::default().save()?;
            println!("Created config file at: {}", config_path.display());
            println!();
            println!("{}", Config::generate_default_config());
        }
        return Ok(());
    }

    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        "built-in defaults (run 'osvstats config --init' to create a file)".to_string()
    };
    println!("Loaded from: {}", source);
    println!("Data root:   {}", layout.root().display());
    println!("Flat table:  {}", layout.flat_csv().display());
    println!("Summary:     {}", layout.summary_csv().display());
    println!();
    println!("{}", config.to_toml()?);

    Ok(())
}
