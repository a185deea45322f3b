// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rover-drive")]
#[command(about = "Drive a rover model around a lit ground plane", long_about = None)]
pub struct Cli {
    /// glTF/GLB model to drive; a built-in placeholder rover is used when omitted
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// JSON file with tuning constants (rotation step, acceleration, ...)
    #[arg(long)]
    pub tuning: Option<PathBuf>,

    /// Start from a vehicle state saved with --save-state
    #[arg(long = "load-state")]
    pub load_state: Option<PathBuf>,

    /// Write the final vehicle state here on exit
    #[arg(long = "save-state")]
    pub save_state: Option<PathBuf>,

    /// Record every frame's input and write the log here on exit
    #[arg(long, conflicts_with = "replay")]
    pub record: Option<PathBuf>,

    /// Drive the vehicle from a recorded input log instead of the keyboard
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Keep the camera trailing the vehicle
    #[arg(long = "follow-camera", default_value = "false")]
    pub follow_camera: bool,

    /// Disable UI elements
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}
