//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `link`: Link one track given on the command line
//! - `batch`: Link every JAMS annotation in a directory
//! - `config`: Show the configuration file location and contents

mod batch;
mod config;
mod link;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self as settings, Config};
use crate::linking::{InputRecord, LinkEngine, MatchConfig};

pub use batch::cmd_batch;
pub use config::cmd_config;
pub use link::cmd_link;

/// Music Linker CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Link one track against all providers
    Link {
        #[command(flatten)]
        track: TrackArgs,
        #[command(flatten)]
        matching: MatchArgs,
        /// Print the unified record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Link every JAMS annotation file in a directory
    Batch {
        /// Directory containing .jams files
        dir: PathBuf,
        /// Output directory (default: <DIR>/jams_aligned)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Recursive directory scan
        #[arg(short, long)]
        recursive: bool,
        /// Dry run - link and report without writing files
        #[arg(long)]
        dry_run: bool,
        /// Write a JSON summary of the run to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
        #[command(flatten)]
        matching: MatchArgs,
    },
    /// Show configuration
    Config {
        /// Print the config file path only
        #[arg(long, conflicts_with = "defaults")]
        path: bool,
        /// Print the built-in defaults instead of the loaded configuration
        #[arg(long, conflicts_with = "init")]
        defaults: bool,
        /// Write the default configuration file if none exists yet
        #[arg(long, conflicts_with = "path")]
        init: bool,
    },
}

/// Track metadata given on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct TrackArgs {
    /// Artist name
    #[arg(long)]
    pub artist: Option<String>,
    /// Track title
    #[arg(long)]
    pub title: Option<String>,
    /// Album name
    #[arg(long)]
    pub album: Option<String>,
    /// Track number
    #[arg(long)]
    pub track: Option<u32>,
    /// Duration in seconds
    #[arg(long)]
    pub duration: Option<f64>,
    /// Release year
    #[arg(long)]
    pub year: Option<i32>,
    /// MusicBrainz recording id
    #[arg(long)]
    pub mbid: Option<String>,
    /// ISRC
    #[arg(long)]
    pub isrc: Option<String>,
}

impl TrackArgs {
    pub fn input_record(&self, strict: bool) -> InputRecord {
        InputRecord {
            artist: self.artist.clone(),
            album: self.album.clone(),
            title: self.title.clone(),
            track_number: self.track,
            duration: self.duration,
            release_year: self.year,
            canonical_id: self.mbid.clone(),
            recording_code: self.isrc.clone(),
            strict,
        }
    }
}

/// Matching overrides shared by `link` and `batch`
#[derive(Args, Debug, Clone, Default)]
pub struct MatchArgs {
    /// Only accept confident, unambiguous matches
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,
    /// Accept the best candidate above the lenient threshold
    #[arg(long)]
    pub lenient: bool,
    /// Don't re-query providers with identifiers discovered during linking
    #[arg(long)]
    pub no_follow: bool,
}

impl MatchArgs {
    /// Effective strictness: flags win over the config file.
    pub fn strict(&self, config: &Config) -> bool {
        if self.strict {
            true
        } else if self.lenient {
            false
        } else {
            config.matching.strict
        }
    }

    pub fn match_config(&self, config: &Config) -> MatchConfig {
        let mut match_config = config.match_config();
        if self.no_follow {
            match_config.follow_identifiers = false;
        }
        match_config
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli, rt: &Runtime) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => settings::load_from(path),
        None => settings::load(),
    };

    match &cli.command {
        Commands::Link {
            track,
            matching,
            json,
        } => cmd_link(rt, &config, track, matching, *json),
        Commands::Batch {
            dir,
            output,
            recursive,
            dry_run,
            report,
            matching,
        } => cmd_batch(
            rt,
            &config,
            dir,
            output.as_ref(),
            *recursive,
            *dry_run,
            report.as_ref(),
            matching,
        ),
        Commands::Config {
            path,
            defaults,
            init,
        } => cmd_config(&config, cli.config.as_ref(), *path, *defaults, *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Build the engine with the built-in providers
pub(crate) fn build_engine(config: &Config) -> anyhow::Result<LinkEngine> {
    Ok(LinkEngine::with_defaults(&config.provider_settings())?)
}
