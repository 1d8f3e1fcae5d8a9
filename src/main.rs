//! amlyrics - Apple Music-style scrolling lyrics
//!
//! Previews the lyric scroll effect in the terminal and exports it as an
//! After Effects script.
//!
//! ## Commands
//! - `preview`: animate the lyrics in the terminal
//! - `frame`: print every line's (or one line's) visual state at one active position
//! - `export`: write the After Effects script
//! - `config`: write or print the effective configuration

mod app;
mod features;
mod utils;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use app::{App, ConfigOverrides};
use features::lyrics::DriverOptions;

#[derive(Parser)]
#[command(name = "amlyrics")]
#[command(about = "Apple Music-style scrolling lyrics for the terminal and After Effects")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to the per-user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate the lyrics in the terminal
    Preview {
        /// Lyrics file (plain text or LRC)
        #[arg(short, long)]
        lyrics: Option<PathBuf>,

        /// Line focused at start
        #[arg(long, default_value_t = 2)]
        start: usize,

        /// Milliseconds between line advances
        #[arg(long, default_value_t = 2000)]
        period_ms: u64,

        /// Stop after this many advances
        #[arg(long)]
        steps: Option<u64>,

        /// Glide between lines with the damped transition
        #[arg(long)]
        smooth: bool,

        /// Milliseconds between sub-frames when gliding
        #[arg(long, default_value_t = 33)]
        frame_ms: u64,
    },

    /// Print the visual state of every line as JSON
    Frame {
        /// Lyrics file (plain text or LRC)
        #[arg(short, long)]
        lyrics: Option<PathBuf>,

        /// Active position, may be fractional
        #[arg(short, long, allow_negative_numbers = true)]
        active: f64,

        /// Report only this line (0-based)
        #[arg(long)]
        line: Option<usize>,
    },

    /// Write the After Effects script
    Export {
        /// Lyrics file (plain text or LRC)
        #[arg(short, long)]
        lyrics: Option<PathBuf>,

        /// Output directory or file
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Marker spacing in milliseconds for lyrics without timing
        #[arg(long, default_value_t = 2000)]
        period_ms: u64,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the effective configuration
    Init {
        /// Destination (defaults to the per-user config location)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    Show,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // stdout carries frames and JSON
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = app::resolve_config(cli.config.as_deref(), &cli.overrides)?;

    match cli.command {
        Commands::Preview {
            lyrics,
            start,
            period_ms,
            steps,
            smooth,
            frame_ms,
        } => {
            let app = App::new(config, app::resolve_lyrics(lyrics.as_deref())?);
            let options = DriverOptions {
                start_index: start,
                step_period: Duration::from_millis(period_ms.max(1)),
                frame_period: smooth.then(|| Duration::from_millis(frame_ms.max(1))),
                max_steps: steps,
            };
            let summary = app.run_preview(options).await?;
            let last = app
                .lyrics()
                .get(summary.final_index)
                .map(|l| l.text.as_str())
                .unwrap_or_default();
            eprintln!(
                "Stopped on line {} \"{}\" after {} steps",
                summary.final_index, last, summary.steps
            );
        }

        Commands::Frame {
            lyrics,
            active,
            line,
        } => {
            let app = App::new(config, app::resolve_lyrics(lyrics.as_deref())?);
            let json = match line {
                Some(index) => app.line_json(index, active)?,
                None => app.frame_json(active)?,
            };
            println!("{}", json);
        }

        Commands::Export {
            lyrics,
            out,
            period_ms,
        } => {
            let app = App::new(config, app::resolve_lyrics(lyrics.as_deref())?);
            let path = app.export(&out, Duration::from_millis(period_ms.max(1)))?;
            println!("{}", path.display());
        }

        Commands::Config { action } => match action {
            ConfigAction::Init { out } => {
                let path = app::init_config(&config, out.as_deref())?;
                println!("{}", path.display());
            }
            ConfigAction::Show => {
                println!("{}", app::config_json(&config)?);
            }
        },
    }

    Ok(())
}
