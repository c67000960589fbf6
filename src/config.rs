//! Export settings
//!
//! Rendering knobs shared by the pattern expansion and the export pipeline.
//! Settings can be loaded from a JSON file; missing fields take defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkipjackError};

/// Settings that control how a rule list is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Radius in samples used when sewing hard seams
    pub smoothing_rate: usize,

    /// Sew excerpts that join without a lead-in instead of splicing them
    pub sew_seams: bool,

    /// Magnitude below which a sample may be treated as a dropout
    pub depopping_sensitivity: f64,

    /// Speed factor applied once to the whole rendered track
    pub final_speed_factor: f64,

    /// Lead-in crossfade length in samples
    pub blur_length: usize,

    /// Swap the meaning of letter case (lowercase plays forward)
    pub invert_reverses: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            smoothing_rate: 64,
            sew_seams: false,
            depopping_sensitivity: 256.0,
            final_speed_factor: 1.0,
            blur_length: 256,
            invert_reverses: false,
        }
    }
}

impl ExportSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkipjackError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| SkipjackError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| SkipjackError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reject values the renderer cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !(self.final_speed_factor.is_finite() && self.final_speed_factor > 0.0) {
            return Err(SkipjackError::InvalidSettings {
                reason: format!(
                    "final_speed_factor must be positive, got {}",
                    self.final_speed_factor
                ),
            });
        }
        if !(self.depopping_sensitivity.is_finite() && self.depopping_sensitivity >= 0.0) {
            return Err(SkipjackError::InvalidSettings {
                reason: format!(
                    "depopping_sensitivity must be non-negative, got {}",
                    self.depopping_sensitivity
                ),
            });
        }
        Ok(())
    }
}
