//! Skipjacker - Pattern-Driven Audio Re-Assembly
//!
//! Skipjacker rebuilds a track from an ordered list of rules. Each rule
//! carves a span of the source into labelled excerpts and plays them back
//! in the order a pattern string gives, reversed where the pattern uses
//! lowercase, time-scaled and crossfaded at every join.
//!
//! # Architecture
//!
//! - `engine`: PCM container codec, segment transforms, playback
//! - `rules`: rules, the sample mini-language, rule files, pattern expansion
//! - `state`: the project store with selection and undo/redo history
//! - `config`: export settings
//! - `cli`: command-line front end

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod numeric;
pub mod rules;
pub mod state;

pub use config::ExportSettings;
pub use error::{Result, SkipjackError};
