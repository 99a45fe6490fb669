//! ModelStack console
//!
//! Browses, edits, validates and deploys models served from a fixtures
//! directory.
//!
//! Usage:
//!   modelstack show [MODEL]
//!   modelstack set definition=media/attribute=label '{"en":"Media files"}'
//!   modelstack validate media
//!   modelstack deploy media video

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use modelstack_console::{Console, ConsoleConfig, DEFAULT_CONFIG_FILE};
use modelstack_types::Language;
use std::io::Write;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "modelstack")]
#[command(about = "ModelStack model administration console")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Fixtures directory, overriding the configuration
    #[arg(short, long)]
    fixtures: Option<PathBuf>,

    /// Language to describe models in, overriding the configuration
    #[arg(short, long)]
    language: Option<Language>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List models, or print one model with its attributes
    Show { model: Option<String> },
    /// Set an attribute and save the change
    Set {
        /// Attribute path, e.g. definition=media/field=title/attribute=displayType
        path: String,
        /// New value as JSON; anything that is not JSON is taken as a string
        value: String,
    },
    /// Validate a model
    Validate { model: String },
    /// Deploy models
    Deploy {
        /// Models to preselect
        models: Vec<String>,
        /// Select every model without validation errors
        #[arg(long)]
        all: bool,
    },
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over --verbose when set.
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
        return;
    }
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = ConsoleConfig::load(&args.config);
    if let Some(fixtures) = args.fixtures {
        config.fixtures = fixtures;
    }
    debug!("Using fixtures at {:?}", config.fixtures);

    let mut console = Console::open(&config).await?;
    if let Some(language) = args.language {
        console.set_language(language);
    }

    let mut out = std::io::stdout().lock();
    match args.command {
        Command::Show { model } => console.show(model.as_deref(), &mut out).await?,
        Command::Set { path, value } => {
            console.set(&path, &value, &mut out).await?;
        }
        Command::Validate { model } => {
            if !console.validate(&model, &mut out).await? {
                out.flush()?;
                bail!("Model {model} is invalid");
            }
        }
        Command::Deploy { models, all } => {
            console.deploy(&models, all, &mut out).await?;
        }
    }
    out.flush()?;
    Ok(())
}
