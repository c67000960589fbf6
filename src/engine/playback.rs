//! Playback
//!
//! Hands rendered audio to an external player. Only one stream is active
//! at a time: every new play request stops the current stream first.
//!
//! The audio is written to a scratch container and the player is given the
//! path. The player runs on its own; `play` returns once it has started.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use log::{debug, info, warn};

use crate::config::ExportSettings;
use crate::engine::segment::Segment;
use crate::engine::wave::Waveform;
use crate::error::{Result, SkipjackError};
use crate::rules::{skipjack, Render, Rule};

/// Default scratch file name used for playback.
pub const SCRATCH_FILE: &str = "skipjacker-playback.wav";

/// Playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing is playing (default state)
    #[default]
    Stopped,
    /// A stream is playing
    Playing,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
        }
    }
}

/// Something that can play a container file.
pub trait Player {
    /// Start playing the file at `path`.
    fn play(&mut self, path: &Path) -> Result<()>;

    /// Stop whatever is playing. Stopping an idle player is not an error.
    fn stop(&mut self) -> Result<()>;
}

/// Player that runs an external program with the file path as its last
/// argument, e.g. `aplay` or `afplay`.
#[derive(Debug)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            child: None,
        }
    }

    /// Parse a command line such as `"play -q"` into program and arguments.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| SkipjackError::PlaybackError {
            reason: "player command is empty".to_string(),
        })?;
        Ok(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
            child: None,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Block until the running player exits.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            child.wait().map_err(|e| SkipjackError::PlaybackError {
                reason: format!("failed waiting for {}: {}", self.program, e),
            })?;
        }
        Ok(())
    }
}

impl Player for CommandPlayer {
    fn play(&mut self, path: &Path) -> Result<()> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .spawn()
            .map_err(|e| SkipjackError::PlaybackError {
                reason: format!("failed to start {}: {}", self.program, e),
            })?;
        debug!("Started {} (pid {})", self.program, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            // The player may already have exited on its own
            if let Err(e) = child.kill() {
                debug!("Player {} already stopped: {}", self.program, e);
            }
            let _ = child.wait();
        }
        Ok(())
    }
}

/// Owns a player and guarantees a single active stream.
#[derive(Debug)]
pub struct PlaybackController<P: Player> {
    player: P,
    state: PlaybackState,
    scratch_path: PathBuf,
}

impl<P: Player> PlaybackController<P> {
    /// Create a controller writing scratch audio to the system temp dir.
    pub fn new(player: P) -> Self {
        Self::with_scratch_path(player, std::env::temp_dir().join(SCRATCH_FILE))
    }

    pub fn with_scratch_path(player: P, scratch_path: impl Into<PathBuf>) -> Self {
        Self {
            player,
            state: PlaybackState::Stopped,
            scratch_path: scratch_path.into(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn scratch_path(&self) -> &Path {
        &self.scratch_path
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Stop the active stream, if any.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            self.player.stop()?;
            self.state = PlaybackState::Stopped;
            info!("Playback stopped");
        }
        Ok(())
    }

    /// Play `segment` using `source`'s header.
    pub fn play_segment(&mut self, source: &Waveform, segment: &Segment) -> Result<()> {
        self.stop()?;
        let mut output = source.empty_like();
        output.set_segment(segment)?;
        output.save(&self.scratch_path)?;
        debug!("Scratch file saved to {}", self.scratch_path.display());

        self.player.play(&self.scratch_path)?;
        self.state = PlaybackState::Playing;
        info!(
            "Playback started ({} sec)",
            segment.play_time(source.sample_rate())
        );
        Ok(())
    }

    /// Play `length` samples of the unprocessed source from `start`.
    pub fn play_source(&mut self, source: &Waveform, start: i64, length: i64) -> Result<()> {
        let segment = source.get_segment(start as f64, length as f64);
        self.play_segment(source, &segment)
    }

    /// Render `rules` against `source` and play the result.
    pub fn render_and_play<'a, I>(
        &mut self,
        source: &Waveform,
        rules: I,
        settings: &ExportSettings,
    ) -> Result<Render>
    where
        I: IntoIterator<Item = &'a Rule>,
    {
        self.stop()?;
        let render = skipjack(&source.to_segment(), rules, settings)?;
        if render.segment.is_empty() {
            warn!("Rendered audio is empty; nothing to play");
            return Ok(render);
        }
        self.play_segment(source, &render.segment)?;
        Ok(render)
    }
}
