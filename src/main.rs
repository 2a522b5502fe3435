//! ABX Studio - Terminal-based A/B audio comparison player.
//!
//! Load two or more takes of the same material and flip between them
//! without losing your place: switching tracks preserves the playhead
//! position, so differences in a mix or master stay audible instead of
//! being masked by a restart. Playback runs in a keyboard-driven TUI
//! with per-track colors, seek, volume, mute, loop, playback rate, and
//! time markers for spots worth re-checking.
//!
//! The tool is designed for musicians and audio engineers who prefer
//! working in the terminal and want a fast workflow for auditioning
//! alternate versions of a track.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

mod cli;
mod config;
mod constants;
mod engine;
mod player;

#[derive(Parser)]
#[command(name = "abx")]
#[command(about = "Terminal-based A/B audio comparison player")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Compare audio files in the player
    Play {
        /// Audio files to load (wav, flac)
        files: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(["default_volume", "seek_step_secs", "max_tracks", "max_file_mib"]))]
        key: String,
        /// Configuration value
        value: String,
    },
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Play { files } => {
            cli::play::handle_play(&files)?;
        }
    }

    Ok(())
}
