//! Moodify engine - Main entry point
//!
//! Reads newline-delimited JSON requests from a file or stdin and writes one
//! JSON response per line to stdout. Logs go to stderr or the configured file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use moodify_common::config::{load_config, write_toml_config, LoggingConfig, TomlConfig};
use moodify_engine::registry::DEFAULT_STREAM;
use moodify_engine::MoodService;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for moodify-engine
#[derive(Parser, Debug)]
#[command(name = "moodify-engine")]
#[command(about = "Face/voice emotion fusion and voice stabilization engine")]
#[command(version)]
struct Args {
    /// Configuration file (overrides MOODIFY_CONFIG and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request file, one JSON request per line (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Voice stream for requests that do not name one
    #[arg(short, long, default_value = DEFAULT_STREAM, env = "MOODIFY_STREAM")]
    stream: String,

    /// Write a default configuration file to PATH and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(target) = &args.init_config {
        write_toml_config(&TomlConfig::default(), target)
            .with_context(|| format!("Failed to write config to {}", target.display()))?;
        println!("Wrote default configuration to {}", target.display());
        return Ok(());
    }

    let (config, config_path) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging)?;

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }
    info!("Default voice stream: {}", args.stream);

    let service = MoodService::from_config(&config);

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let handled = process_lines(&service, reader, &args.stream).await?;

    info!(
        "Processed {} request(s) across {} voice stream(s)",
        handled,
        service.registry().len().await
    );
    Ok(())
}

/// Handle every non-blank line, printing one response per request
async fn process_lines(
    service: &MoodService,
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    default_stream: &str,
) -> Result<usize> {
    let mut lines = reader.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let response = service.handle_line(&line, default_stream).await;
        debug!(request_id = %response.request_id, success = response.success, "Request handled");

        println!("{}", serde_json::to_string(&response)?);
        handled += 1;
    }

    Ok(handled)
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "moodify_engine={0},moodify_common={0}",
            logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let stderr_layer = if file_layer.is_none() {
        Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}
