//! CLI Module
//!
//! Command-line front end over the timeline engine. Every command reads
//! plain values or JSON files and prints its result as JSON.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::markers::MarkerType;
use crate::ripple::RippleMode;

/// Trimline - frame-accurate trim, ripple and marker tools
#[derive(Parser, Debug)]
#[command(name = "trimline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Snap a time to the nearest frame
    #[command(name = "snap")]
    Snap {
        /// Time in seconds
        #[arg(short, long, allow_hyphen_values = true)]
        time: f64,

        /// Frame rate
        #[arg(short, long, default_value_t = 30.0)]
        fps: f64,
    },

    /// Move a time by a number of frames
    #[command(name = "nudge")]
    Nudge {
        /// Time in seconds
        #[arg(short, long, allow_hyphen_values = true)]
        time: f64,

        /// Frames to move (negative moves earlier)
        #[arg(short = 'n', long, allow_hyphen_values = true)]
        frames: f64,

        /// Frame rate
        #[arg(short, long, default_value_t = 30.0)]
        fps: f64,
    },

    /// Predict the quietest cut point near a position in a WAV file
    #[command(name = "cut")]
    Cut {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Normalized position in [0, 1]
        #[arg(short, long)]
        position: f64,
    },

    /// Ripple a change through a set of clips
    #[command(name = "ripple")]
    Ripple {
        /// Clips JSON file: [{"id": ..., "range": {"start": ..., "end": ...}}]
        #[arg(long)]
        clips: PathBuf,

        /// Time the change happened at
        #[arg(short = 'p', long)]
        change_point: f64,

        /// Signed shift in seconds
        #[arg(short, long, allow_hyphen_values = true)]
        delta: f64,

        /// none, forward, backward, bidirectional, magnetic or quantum
        #[arg(short, long, default_value = "forward")]
        mode: RippleMode,

        /// Seed for the quantum mode
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Derive markers from analyzer output
    #[command(name = "markers")]
    Markers {
        /// Analysis JSON file: {"peaks": [...], "emotions": [...], "scenes": [...]}
        #[arg(short, long)]
        analysis: PathBuf,

        /// Only list markers of this type
        #[arg(long)]
        filter: Option<MarkerType>,
    },

    /// Recognize an editing pattern in a marker list
    #[command(name = "recognize")]
    Recognize {
        /// Markers JSON file (as printed by `markers`)
        #[arg(short, long)]
        markers: PathBuf,
    },
}
