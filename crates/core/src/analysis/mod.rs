use std::{f32::consts::PI, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{LuminaError, Result, SpectrumFrame};

/// Decibel range mapped onto the 0–255 magnitude scale.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;
/// Per-bin time smoothing applied in the linear magnitude domain.
const TIME_SMOOTHING: f32 = 0.8;

/// Turns raw sample blocks into byte-magnitude [`SpectrumFrame`]s.
///
/// Windows the signal with a Hann function, runs a forward real FFT, maps
/// magnitudes into a fixed dB range and applies per-bin exponential time
/// smoothing. Blocks overlap by half an FFT so transients are not lost at
/// block edges.
pub struct SpectrumProcessor {
    sample_rate: u32,
    fft_size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    ring: Vec<f32>,
}

impl SpectrumProcessor {
    pub fn new(sample_rate: u32, fft_size: usize) -> Result<Self> {
        if fft_size < 32 || !fft_size.is_power_of_two() {
            return Err(LuminaError::InvalidInput(
                "fft size must be a power of two of at least 32",
            ));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(fft_size);
        let input = plan.make_input_vec();
        let spectrum = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();
        let bin_count = spectrum.len();

        let window = (0..fft_size)
            .map(|i| hann_value(i, fft_size))
            .collect();

        Ok(Self {
            sample_rate,
            fft_size,
            plan,
            input,
            spectrum,
            scratch,
            window,
            smoothed: vec![0.0; bin_count],
            ring: Vec::with_capacity(fft_size * 2),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins in each produced frame.
    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Appends captured samples and analyses every complete block that is
    /// now available. Returns the most recent spectrum, or `None` when not
    /// enough samples have accumulated yet.
    pub fn push_samples(&mut self, samples: &[f32]) -> Result<Option<SpectrumFrame>> {
        self.ring.extend_from_slice(samples);

        let hop = self.fft_size / 2;
        let mut latest = None;
        while self.ring.len() >= self.fft_size {
            for i in 0..self.fft_size {
                self.input[i] = self.ring[i] * self.window[i];
            }
            self.plan
                .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)?;

            let scale = 1.0 / self.fft_size as f32;
            let mut magnitudes = Vec::with_capacity(self.smoothed.len());
            for (slot, bin) in self.smoothed.iter_mut().zip(self.spectrum.iter()) {
                let magnitude = bin.norm() * scale;
                *slot = TIME_SMOOTHING * *slot + (1.0 - TIME_SMOOTHING) * magnitude;
                magnitudes.push(byte_level(*slot));
            }

            latest = Some(SpectrumFrame::new(
                magnitudes,
                self.sample_rate,
                self.fft_size,
            ));
            self.ring.drain(0..hop);
        }

        Ok(latest)
    }

    /// Drops buffered samples and smoothing history.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.smoothed.iter_mut().for_each(|slot| *slot = 0.0);
    }
}

impl std::fmt::Debug for SpectrumProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumProcessor")
            .field("sample_rate", &self.sample_rate)
            .field("fft_size", &self.fft_size)
            .field("buffered", &self.ring.len())
            .finish()
    }
}

/// Maps a linear magnitude onto the 0–255 byte scale via the fixed dB range.
fn byte_level(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let level = (db - MIN_DB) / (MAX_DB - MIN_DB);
    (level.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }
    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
