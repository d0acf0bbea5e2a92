//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Photo booth kiosk: capture a portrait and swap it onto a character
#[derive(Parser, Debug)]
#[command(name = "photobooth-kiosk")]
#[command(version, about = "Photo booth kiosk client for a face-swap service", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Run the interactive kiosk
    photobooth-kiosk run

    # One-shot swap from a file on disk
    photobooth-kiosk swap --photo me.jpg --character batman

    # Check a job started elsewhere
    photobooth-kiosk status 3f9c2a

Set PHOTOBOOTH_SERVER_URL (or [server] base_url) to point at the service.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Face-swap service URL (overrides config and PHOTOBOOTH_SERVER_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the interactive kiosk (default)
    Run,
    /// Swap a photo file onto a character and print the result URL
    Swap {
        /// Photo to upload (PNG, JPEG or WebP)
        #[arg(long, short)]
        photo: PathBuf,
        /// Character id (see `characters`)
        #[arg(long, short = 'C')]
        character: String,
    },
    /// Query the status of a submitted job once
    Status {
        /// Prediction id returned by the service
        prediction_id: String,
    },
    /// List the selectable characters
    Characters,
    /// Check that the face-swap service is reachable
    Health,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
