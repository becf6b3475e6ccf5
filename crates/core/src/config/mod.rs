use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration for one engine instance. All tuning constants
/// live here so that independent instances (and tests) never share state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub audio: AudioConfig,
    pub beat: BeatConfig,
    pub tracker: TrackerConfig,
}

impl EngineConfig {
    /// Loads a JSON preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Persists the configuration as a JSON preset.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Configuration for the spectral side of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub fft_size: usize,
    /// Exponential smoothing factor shared by every band and the beat value.
    pub smoothing: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            fft_size: 2048,
            smoothing: 0.3,
        }
    }
}

/// Beat envelope tuning. All values are fixed configuration, none are
/// derived at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// How fast the beat value falls back to zero, per second.
    pub falloff: f32,
    /// Low-band level below which onsets are never reported.
    pub min_level: f32,
    /// Linear decay rate of the adaptive cutoff, per second.
    pub decay: f32,
    /// Seconds the cutoff stays frozen after an onset.
    pub hold_time: f32,
    /// Multiplier applied to the low band when an onset spikes the value.
    pub overshoot: f32,
    /// Multiplier that lifts the cutoff above the onset level.
    pub cutoff_margin: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            falloff: 2.4,
            min_level: 0.15,
            decay: 0.98,
            hold_time: 0.08,
            overshoot: 1.5,
            cutoff_margin: 1.1,
        }
    }
}

/// Temporal gesture tracking tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Classifier intensities at or below this are treated as "nothing seen".
    pub min_activation: f32,
    /// Consecutive frames required before confidence reaches 1.0.
    pub required_frames: u32,
    /// Minimum confidence before a gesture is reported to consumers.
    pub confidence_gate: f32,
    /// Exponential smoothing weight toward the historical intensity.
    pub intensity_smoothing: f32,
    /// A track not seen for this long is reset outright.
    pub timeout_ms: f64,
    /// Per-tick decay applied to tracks that lost this tick's observation
    /// while the hand itself is still present.
    pub idle_confidence_decay: f32,
    pub idle_intensity_decay: f32,
    /// Steeper per-tick decay applied when the whole hand has vanished.
    pub absent_confidence_decay: f32,
    pub absent_intensity_decay: f32,
    /// Process every Nth camera frame.
    pub frame_skip: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_activation: 0.1,
            required_frames: 3,
            confidence_gate: 0.6,
            intensity_smoothing: 0.7,
            timeout_ms: 200.0,
            idle_confidence_decay: 0.8,
            idle_intensity_decay: 0.9,
            absent_confidence_decay: 0.7,
            absent_intensity_decay: 0.8,
            frame_skip: 2,
        }
    }
}
