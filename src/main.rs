use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use notemap::config::{ProcessSettings, Settings};
use notemap::note::Note;
use notemap::processor::NoteProcessor;

#[derive(Parser)]
#[command(name = "notemap")]
#[command(version = "0.1")]
#[command(about = "Project notes onto a 2D map and cluster them", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Process a JSON array of notes and print the result
    Process {
        /// Read notes from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Use the bundled sample notes
        #[arg(long, conflicts_with = "input")]
        sample: bool,
        #[arg(long)]
        perplexity: Option<f64>,
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long)]
        learning_rate: Option<f64>,
    },
    /// Print the resolved configuration
    Config,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn read_notes(input: Option<PathBuf>, sample: bool) -> Result<Vec<Note>> {
    if sample {
        return notemap::sample_notes().context("Failed to parse bundled sample notes");
    }
    let raw = match input {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read notes from '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Failed to parse notes JSON")
}

fn process_command(
    settings: Settings,
    notes: Vec<Note>,
    request: ProcessSettings,
) -> Result<()> {
    let processor = NoteProcessor::new(settings);
    let result = processor.process(&notes, &request)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);
    let mut settings = Settings::new()?;

    match args.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            notemap::server::serve(settings).await?
        }
        Commands::Process {
            input,
            sample,
            perplexity,
            iterations,
            learning_rate,
        } => {
            let notes = read_notes(input, sample)?;
            let request = ProcessSettings {
                perplexity,
                iterations,
                learning_rate,
            };
            tokio::task::spawn_blocking(move || process_command(settings, notes, request))
                .await??
        }
        Commands::Config => settings.print_config(),
    }
    Ok(())
}
