//! chordid - identify chords from MIDI note numbers
//!
//! Subcommands:
//! - `chordid notes <NOTE>...` - Classify one set of notes
//! - `chordid file <PATH>` - Print the chord timeline of a MIDI file
//! - `chordid live` - Follow note events on stdin
//! - `chordid catalog` - List the chord templates
//! - `chordid config` - Show the effective configuration

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chord_engine::{ChordDetector, Spelling, Thresholds};
use chordconf::ChordConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod midi_file;

#[derive(Parser)]
#[command(name = "chordid")]
#[command(about = "Identify chords from MIDI notes")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./chordid.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Spell black keys with flats (Db, Eb, ...)
    #[arg(long, global = true)]
    flats: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a set of notes
    Notes {
        /// MIDI note numbers (60) or names (C4, Eb3, F#)
        #[arg(required = true)]
        notes: Vec<String>,
    },

    /// Print the chord timeline of a Standard MIDI File
    File {
        /// Path to a .mid file
        path: PathBuf,
    },

    /// Read `on <note> [vel]`, `off <note>` and `clear` lines from stdin
    Live,

    /// List chord templates in precedence order
    Catalog,

    /// Show the effective configuration and its sources
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ChordConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.telemetry.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let json = cli.json || config.display.json;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Notes { notes } => {
            let detector = build_detector(&config, cli.flats)?;
            commands::notes(&mut out, &detector, &notes, json)?;
        }
        Commands::File { path } => {
            let detector = build_detector(&config, cli.flats)?;
            commands::file(&mut out, &detector, &path, json)?;
        }
        Commands::Live => {
            let detector = build_detector(&config, cli.flats)?;
            commands::live(io::stdin().lock(), &mut out, &detector, json)?;
        }
        Commands::Catalog => {
            commands::catalog(&mut out, json)?;
        }
        Commands::Config => {
            commands::config(&mut out, &config, &sources, json)?;
        }
    }

    Ok(())
}

fn build_detector(config: &ChordConfig, flats: bool) -> Result<ChordDetector> {
    let d = &config.detection;
    let thresholds = Thresholds {
        match_floor: d.match_floor,
        root_position_bonus: d.root_position_bonus,
        inversion_search_below: d.inversion_search_below,
        inversion_ratio: d.inversion_ratio,
        power_root_confidence: d.power_root_confidence,
        power_inverted_confidence: d.power_inverted_confidence,
    };
    thresholds.validate().context("Invalid [detection] settings")?;

    let spelling = if flats {
        Spelling::Flats
    } else {
        config
            .display
            .spelling
            .parse::<Spelling>()
            .map_err(anyhow::Error::msg)?
    };

    Ok(ChordDetector::new()
        .with_thresholds(thresholds)
        .with_spelling(spelling))
}
