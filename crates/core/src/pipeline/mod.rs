use serde::{Deserialize, Serialize};

use crate::{
    beat::BeatState, channel::SharedAudioBuffer, spectrum, AudioConfig, BeatConfig, SpectrumFrame,
};

/// The seven smoothed scalars published to the renderer every audio tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSignalFrame {
    pub energy: f32,
    pub treble: f32,
    pub bass: f32,
    pub mids: f32,
    pub highs: f32,
    pub lows: f32,
    pub beat: f32,
}

/// Per-tick orchestration of band analysis and beat detection.
///
/// Owns all smoothing state explicitly so independent pipeline instances
/// never interfere. When a shared buffer is attached, each tick also writes
/// the metric header and the normalized bins into it.
#[derive(Debug)]
pub struct AudioSignalPipeline {
    smoothing: f32,
    beat_config: BeatConfig,
    smoothed: AudioSignalFrame,
    beat: BeatState,
    shared: Option<SharedAudioBuffer>,
}

impl AudioSignalPipeline {
    pub fn new(audio: &AudioConfig, beat: BeatConfig) -> Self {
        Self {
            smoothing: audio.smoothing,
            beat_config: beat,
            smoothed: AudioSignalFrame::default(),
            beat: BeatState::new(),
            shared: None,
        }
    }

    /// Routes this pipeline's output into a shared buffer.
    pub fn attach_shared(&mut self, buffer: SharedAudioBuffer) {
        self.shared = Some(buffer);
    }

    /// Releases the shared buffer handle, if any.
    pub fn detach_shared(&mut self) {
        self.shared = None;
    }

    /// Clears smoothing and beat state. Called on disable.
    pub fn reset(&mut self) {
        self.smoothed = AudioSignalFrame::default();
        self.beat = BeatState::new();
    }

    /// Runs one analysis tick: raw band energies, beat envelope step, then
    /// exponential smoothing of every published channel. `dt` is the time
    /// since the previous tick in seconds.
    pub fn tick(&mut self, frame: &SpectrumFrame, dt: f32) -> AudioSignalFrame {
        let raw = spectrum::analyze(frame);

        // Beat detection runs on the raw low band; smoothing would blunt
        // exactly the transients it is looking for.
        self.beat = self.beat.step(raw.lows, dt, &self.beat_config);

        let t = self.smoothing;
        self.smoothed.energy = lerp(self.smoothed.energy, raw.energy, t);
        self.smoothed.treble = lerp(self.smoothed.treble, raw.treble, t);
        self.smoothed.bass = lerp(self.smoothed.bass, raw.bass, t);
        self.smoothed.mids = lerp(self.smoothed.mids, raw.mids, t);
        self.smoothed.highs = lerp(self.smoothed.highs, raw.highs, t);
        self.smoothed.lows = lerp(self.smoothed.lows, raw.lows, t);
        self.smoothed.beat = lerp(self.smoothed.beat, self.beat.value, t);

        if let Some(shared) = &self.shared {
            for (bin, &magnitude) in frame.magnitudes.iter().enumerate() {
                shared.write_bin(bin, magnitude as f32 / 255.0);
            }
            shared.write_header(&self.smoothed);
        }

        self.smoothed
    }

    /// Most recently published frame.
    pub fn current(&self) -> AudioSignalFrame {
        self.smoothed
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{slot, SharedAudioBuffer};

    const DT: f32 = 1.0 / 60.0;

    fn pipeline() -> AudioSignalPipeline {
        AudioSignalPipeline::new(&AudioConfig::default(), BeatConfig::default())
    }

    fn low_heavy_frame() -> SpectrumFrame {
        let edges = spectrum::band_edges(1025, 44_100, 2048);
        let mut magnitudes = vec![10u8; 1025];
        for value in magnitudes.iter_mut().take(edges.low_end) {
            *value = 200;
        }
        SpectrumFrame::new(magnitudes, 44_100, 2048)
    }

    #[test]
    fn smoothing_approaches_the_raw_value() {
        let mut pipeline = pipeline();
        let frame = SpectrumFrame::new(vec![255; 1025], 44_100, 2048);

        let first = pipeline.tick(&frame, DT);
        assert!((first.energy - 0.3).abs() < 1e-5);

        let mut last = first;
        for _ in 0..40 {
            last = pipeline.tick(&frame, DT);
        }
        assert!(last.energy > 0.99);
    }

    #[test]
    fn low_heavy_audio_pulses_the_beat_then_decays() {
        let mut pipeline = pipeline();
        let loud = low_heavy_frame();
        let quiet = SpectrumFrame::new(vec![0u8; 1025], 44_100, 2048);

        let mut peak = 0.0f32;
        let mut frame = AudioSignalFrame::default();
        for _ in 0..10 {
            frame = pipeline.tick(&loud, DT);
            peak = peak.max(frame.beat);
            assert!(frame.bass > frame.mids);
        }
        assert!(peak > 0.5, "beat should pulse, got {peak}");
        assert!(frame.lows > 0.7);

        for _ in 0..240 {
            frame = pipeline.tick(&quiet, DT);
        }
        assert!(frame.beat < 0.01);
        assert!(frame.lows < 0.01);
    }

    #[test]
    fn shared_buffer_receives_header_and_bins() {
        let mut pipeline = pipeline();
        let buffer = SharedAudioBuffer::new(1025);
        pipeline.attach_shared(buffer.clone());

        let published = pipeline.tick(&low_heavy_frame(), DT);
        assert_eq!(buffer.read(slot::LOWS).to_bits(), published.lows.to_bits());
        assert_eq!(buffer.read(slot::BEAT).to_bits(), published.beat.to_bits());
        assert!((buffer.read_bin(0) - 200.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_all_state() {
        let mut pipeline = pipeline();
        for _ in 0..5 {
            pipeline.tick(&low_heavy_frame(), DT);
        }
        pipeline.reset();
        assert_eq!(pipeline.current(), AudioSignalFrame::default());
    }
}
