//! Audio Engine Module
//!
//! Core audio handling:
//! - Fixed-layout PCM container codec
//! - Segment transforms and crossfaded joins
//! - Playback through an external player

pub mod blend;
pub mod playback;
pub mod segment;
pub mod wave;

pub use blend::{lead_blend, SegmentWithLead};
pub use playback::{CommandPlayer, PlaybackController, PlaybackState, Player};
pub use segment::{append, concat, depop, extract, play_time, reverse, scale_time, sew, Segment};
pub use wave::{WaveHeader, Waveform, HEADER_LEN};
