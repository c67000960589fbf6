//! CLI Module
//!
//! Command-line interface for Skipjacker.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ExportSettings;
use crate::error::Result;

/// Skipjacker - re-assemble audio from pattern rules
#[derive(Parser, Debug)]
#[command(name = "skipjacker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Rendering options shared by every command that runs the expansion.
///
/// Flags override values from `--settings`.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// JSON file with export settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Lead-in crossfade length in samples
    #[arg(long)]
    pub blur_length: Option<usize>,

    /// Speed factor applied to the whole rendered track
    #[arg(long)]
    pub final_speed: Option<f64>,

    /// Seam smoothing radius in samples
    #[arg(long)]
    pub smoothing_rate: Option<usize>,

    /// Sew excerpts that join without a lead-in
    #[arg(long)]
    pub sew_seams: bool,

    /// Play lowercase labels forward and uppercase reversed
    #[arg(long)]
    pub invert_reverses: bool,

    /// Repair near-silent dropouts in the rendered track
    #[arg(long)]
    pub depop: bool,

    /// Magnitude under which a sample counts as a dropout
    #[arg(long)]
    pub depop_sensitivity: Option<f64>,
}

impl RenderArgs {
    /// Resolve the settings file and flag overrides into validated settings.
    pub fn resolve(&self) -> Result<ExportSettings> {
        let mut settings = match &self.settings {
            Some(path) => ExportSettings::load(path)?,
            None => ExportSettings::default(),
        };
        if let Some(blur_length) = self.blur_length {
            settings.blur_length = blur_length;
        }
        if let Some(final_speed) = self.final_speed {
            settings.final_speed_factor = final_speed;
        }
        if let Some(smoothing_rate) = self.smoothing_rate {
            settings.smoothing_rate = smoothing_rate;
        }
        if let Some(sensitivity) = self.depop_sensitivity {
            settings.depopping_sensitivity = sensitivity;
        }
        if self.sew_seams {
            settings.sew_seams = true;
        }
        if self.invert_reverses {
            settings.invert_reverses = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a rule file against a WAV file and write the result
    #[command(name = "export")]
    Export {
        /// Source WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Rule file (JSON)
        #[arg(short, long)]
        rules: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Sample rate written to the output header
        #[arg(long)]
        sample_rate: Option<u32>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print a WAV file's header fields
    #[command(name = "info")]
    Info {
        /// WAV file
        path: PathBuf,
    },

    /// List the rules in a rule file
    #[command(name = "rules")]
    Rules {
        /// Rule file (JSON)
        path: PathBuf,
    },

    /// Write a rule file of identical, contiguous rules
    #[command(name = "new-rules")]
    NewRules {
        /// Rule file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Sample listings, e.g. "F,2;G,2"
        #[arg(short, long)]
        samples: String,

        /// Pattern string, e.g. "FGgG"
        #[arg(short, long)]
        pattern: String,

        /// Length of each rule in seconds
        #[arg(short, long)]
        length_secs: f64,

        /// Number of rules
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Time-scale divisor
        #[arg(short, long, default_value_t = 2.0)]
        factor: f64,

        /// Gain
        #[arg(long, default_value_t = 1.0)]
        volume: f64,

        /// Sample rate used to convert seconds to samples
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
    },

    /// Render a range of rules only
    #[command(name = "preview")]
    Preview {
        /// Source WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Rule file (JSON)
        #[arg(short, long)]
        rules: PathBuf,

        /// First rule index
        #[arg(long)]
        from: i64,

        /// Last rule index (inclusive)
        #[arg(long)]
        to: i64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render a rule file and play it through an external player
    #[command(name = "play")]
    Play {
        /// Source WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Rule file (JSON)
        #[arg(short, long)]
        rules: PathBuf,

        /// Player command; the WAV path is appended
        #[arg(long, default_value = "aplay")]
        player: String,

        #[command(flatten)]
        render: RenderArgs,
    },
}
