use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use musedl_acquire::{Session, SessionConfig};

#[derive(Parser)]
#[command(name = "musedl")]
#[command(about = "Sheet music score and audio render downloader")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the host for scores matching a query
    Search {
        /// Search query text
        query: String,
    },

    /// Download a score given its page URL
    Get {
        /// The score's page URL
        url: String,

        /// Output file name without extension (defaults to the song name)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory, created if missing
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Formats to download
        #[arg(short, long, value_enum, value_delimiter = ',', default_value = "pdf")]
        format: Vec<Format>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    Pdf,
    Mp3,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let session = Session::new(SessionConfig::default())?;

    match cli.command {
        Commands::Search { query } => {
            let results = session.search(&query).await?;
            if results.is_empty() {
                println!("No results for '{query}'");
                return Ok(());
            }
            for score in &results {
                let note = if score.is_official {
                    " (official, not downloadable)"
                } else {
                    ""
                };
                println!(
                    "{:>10}  {} — {} [{} page(s)]{note}",
                    score.id, score.title, score.artist, score.page_count
                );
                println!("{:>10}  {}", "", score.url);
            }
        }
        Commands::Get { url, name, dir, format } => {
            let score = session.score_from_url(&url).await?;
            if score.is_official {
                anyhow::bail!("'{}' is an official score and cannot be downloaded", score.title);
            }

            let name = name.unwrap_or_else(|| score.name.clone());
            std::fs::create_dir_all(&dir)?;
            let base = dir.join(&name);

            if format.contains(&Format::Pdf) {
                let path = base.with_extension("pdf");
                let report = session.download_sheet_to(&score, &path).await?;
                print_written(&path);
                if report.pages_skipped > 0 {
                    tracing::warn!(
                        skipped = report.pages_skipped,
                        "Some pages had no render and were left out"
                    );
                }
            }
            if format.contains(&Format::Mp3) {
                let path = base.with_extension("mp3");
                session.download_audio_to(&score, &path).await?;
                print_written(&path);
            }
        }
    }

    Ok(())
}

fn print_written(path: &Path) {
    println!("Finished writing '{}'", path.display());
}
